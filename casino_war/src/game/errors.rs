//! Game error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Card, GameMode, SeatId};

/// Every way an action can be rejected. A rejected action never mutates
/// game state; the message is surfaced to the initiating client only.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("no cards left in the deck, shuffle required")]
    DeckEmpty,
    #[error("not enough cards left for every seat and the dealer")]
    NotEnoughCards,
    #[error("invalid card {0:?}")]
    InvalidCard(String),
    #[error("card {0} is not in the deck")]
    CardNotInDeck(Card),
    #[error("invalid seat id {0:?}")]
    InvalidSeatId(String),
    #[error("seat {0} is outside the table (seats are 1-{1})")]
    SeatOutOfBounds(SeatId, u8),
    #[error("seat {0} is already occupied")]
    SeatOccupied(SeatId),
    #[error("seat {0} is not occupied")]
    SeatNotFound(SeatId),
    #[error("the dealer already has a card")]
    DealerCardSet,
    #[error("seat {0} already has a card")]
    SeatCardSet(SeatId),
    #[error("the dealer already has a war card")]
    DealerWarCardSet,
    #[error("seat {0} already has a war card")]
    SeatWarCardSet(SeatId),
    #[error("a player id is required when targeting a seat")]
    MissingPlayerId,
    #[error("seat {0} is not waiting on a war choice")]
    NotAwaitingChoice(SeatId),
    #[error("seat {0} is not in the war round")]
    NotInWar(SeatId),
    #[error("no war round is active")]
    NoWarRound,
    #[error("war cards are still unassigned")]
    WarCardsUnassigned,
    #[error("not every slot has a card assigned")]
    CardsUnassigned,
    #[error("the round has already been evaluated")]
    AlreadyEvaluated,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("a round is already active")]
    RoundActive,
    #[error("no round is active")]
    RoundNotActive,
    #[error("no seats are occupied")]
    NoPlayers,
    #[error("not allowed in {0} mode")]
    WrongMode(GameMode),
    #[error("cannot change the game mode while a round is active")]
    ModeChangeDuringRound,
    #[error("minimum bet {min} and maximum bet {max} are not a valid range")]
    InvalidBetLimits { min: u32, max: u32 },
    #[error("registration is handled by the connection gateway")]
    ConnectionAction,
}
