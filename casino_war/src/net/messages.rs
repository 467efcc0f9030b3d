use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::entities::{Card, DealTarget, GameMode, Outcome, SeatId, WarChoice};

/// An inbound client action. One closed variant per wire action, with
/// the `action` field as the discriminator, so dispatch is exhaustive at
/// compile time instead of stringly-typed.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    /// Identify this connection as the dealer console.
    RegisterDealer,
    /// Identify this connection as the view for one seat.
    RegisterPlayer { player_id: SeatId },
    AddPlayer { player_id: SeatId },
    RemovePlayer { player_id: SeatId },
    ShuffleDeck,
    BurnCard,
    SetGameMode { mode: GameMode },
    /// Manual-mode full deal drawn from the shoe.
    DealCards,
    /// Automatic-mode full deal; war resolution also runs unattended.
    StartAutoRound,
    /// Assign one specific card to one unfilled slot (manual/live).
    ManualDealCard {
        target: DealTarget,
        card: Card,
        player_id: Option<SeatId>,
    },
    EvaluateRound,
    PlayerChoice { player_id: SeatId, choice: WarChoice },
    AssignWarCard {
        target: DealTarget,
        card: Card,
        player_id: Option<SeatId>,
    },
    EvaluateWarRound,
    UndoLastCard,
    /// Direct override path for one seat's result.
    ManualAssignResult { player_id: SeatId, result: Outcome },
    ClearRound,
    ResetGame,
    ChangeBets { min_bet: u32, max_bet: u32 },
    ChangeTable { table_number: u32 },
    GetGameState,
    GetAllPlayerStats,
    ClearAllStats,
}

impl fmt::Display for ClientAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::RegisterDealer => "register dealer".to_string(),
            Self::RegisterPlayer { player_id } => format!("register seat {player_id}"),
            Self::AddPlayer { player_id } => format!("add seat {player_id}"),
            Self::RemovePlayer { player_id } => format!("remove seat {player_id}"),
            Self::ShuffleDeck => "shuffle the deck".to_string(),
            Self::BurnCard => "burn a card".to_string(),
            Self::SetGameMode { mode } => format!("switch to {mode} mode"),
            Self::DealCards => "deal cards".to_string(),
            Self::StartAutoRound => "start an automatic round".to_string(),
            Self::ManualDealCard {
                target,
                card,
                player_id,
            } => match player_id {
                Some(id) => format!("deal {card} to seat {id}"),
                None => format!("deal {card} to the {target}"),
            },
            Self::EvaluateRound => "evaluate the round".to_string(),
            Self::PlayerChoice { player_id, choice } => {
                format!("seat {player_id} chooses {choice}")
            }
            Self::AssignWarCard {
                target,
                card,
                player_id,
            } => match player_id {
                Some(id) => format!("assign war card {card} to seat {id}"),
                None => format!("assign war card {card} to the {target}"),
            },
            Self::EvaluateWarRound => "evaluate the war round".to_string(),
            Self::UndoLastCard => "undo the last card".to_string(),
            Self::ManualAssignResult { player_id, result } => {
                format!("set seat {player_id} to {result}")
            }
            Self::ClearRound => "clear the round".to_string(),
            Self::ResetGame => "reset the game".to_string(),
            Self::ChangeBets { min_bet, max_bet } => {
                format!("change bets to {min_bet}/{max_bet}")
            }
            Self::ChangeTable { table_number } => format!("change to table {table_number}"),
            Self::GetGameState => "request the game state".to_string(),
            Self::GetAllPlayerStats => "request session statistics".to_string(),
            Self::ClearAllStats => "clear session statistics".to_string(),
        };
        write!(f, "{repr}")
    }
}
