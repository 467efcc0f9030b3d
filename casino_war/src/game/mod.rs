//! Casino War game engine - entities, round state machine, and session
//! statistics.
//!
//! This module provides:
//! - Card, deck and seat entities with the wire card encoding
//! - The authoritative round/war state machine
//! - Broadcastable game events
//! - Per-seat session statistics

pub mod entities;
pub mod errors;
pub mod events;
pub mod state_machine;
pub mod stats;

pub use errors::GameError;
pub use events::GameEvent;
pub use state_machine::{GameSettings, RoundPhase, WarState};
pub use stats::{SeatTotals, SessionStats};
