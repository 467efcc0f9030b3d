//! # Casino War
//!
//! An authoritative Casino War table engine with networking types.
//!
//! The game is the simplest one in the house: each seat gets one card,
//! the dealer gets one card, and the higher rank wins. A tied seat
//! chooses between surrendering and going to war, where a fresh card
//! decides the round - or ties again and the war repeats.
//!
//! The engine is a single state machine behind an actor: every inbound
//! action is validated and applied atomically, and every state change is
//! broadcast to all subscribed clients in apply order. Rendering surfaces
//! (dealer console, display board, seat views) are plain consumers of the
//! wire protocol and live outside this crate.
//!
//! ## Core Modules
//!
//! - [`game`]: entities, the round/war state machine, events, statistics
//! - [`net`]: the inbound wire protocol
//! - [`table`]: the actor that owns the game state
//!
//! ## Example
//!
//! ```
//! use casino_war::{WarState, game::entities::SeatId};
//!
//! let mut game = WarState::default();
//! game.add_player(SeatId::new(1)).unwrap();
//! game.shuffle_deck().unwrap();
//! let events = game.deal_cards().unwrap();
//! assert!(!events.is_empty());
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{GameError, GameEvent, GameSettings, WarState, entities, stats};

/// Wire protocol types.
pub mod net;
pub use net::messages;

/// Single-owner table actor.
pub mod table;
pub use table::{TableActor, TableConfig, TableHandle};
