//! Outbound events broadcast to every connected client.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use super::{
    entities::{Card, DealTarget, GameMode, GameSnapshot, Outcome, Seat, SeatId, WarChoice, WarRound},
    stats::SeatTotals,
};

/// One broadcastable game event. Events are emitted in the exact order
/// their causing actions were applied; each carries enough state for a
/// listen-only client to patch its view without querying back.
///
/// The `error` variant is the exception: it is delivered only to the
/// client whose action was rejected.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GameEvent {
    GameStateUpdate {
        game_state: GameSnapshot,
    },
    DeckShuffled {
        deck_count: usize,
        burned_count: usize,
    },
    CardBurned {
        burned_card: Card,
        deck_count: usize,
        burned_count: usize,
    },
    PlayerAdded {
        player_id: SeatId,
        players: BTreeMap<SeatId, Seat>,
    },
    PlayerRemoved {
        player_id: SeatId,
        players: BTreeMap<SeatId, Seat>,
        player_results: BTreeMap<SeatId, Outcome>,
    },
    GameModeChanged {
        mode: GameMode,
    },
    RoundDealt {
        round_number: u64,
        dealer_card: Card,
        players: BTreeMap<SeatId, Seat>,
        tie_players: Vec<SeatId>,
        deck_count: usize,
    },
    CardAssigned {
        target: DealTarget,
        player_id: Option<SeatId>,
        card: Card,
        deck_count: usize,
    },
    PlayerChoiceMade {
        player_id: SeatId,
        choice: WarChoice,
        players: BTreeMap<SeatId, Seat>,
        player_results: BTreeMap<SeatId, Outcome>,
    },
    WarRoundStarted {
        war_round: WarRound,
        players: Vec<SeatId>,
    },
    WarCardAssigned {
        target: DealTarget,
        player_id: Option<SeatId>,
        card: Card,
    },
    WarRoundEvaluated {
        dealer_card: Card,
        players: BTreeMap<SeatId, Seat>,
        player_results: BTreeMap<SeatId, Outcome>,
    },
    RoundCompleted {
        round_number: u64,
        player_results: BTreeMap<SeatId, Outcome>,
        stats: BTreeMap<SeatId, SeatTotals>,
    },
    CardsUndone {
        deck_count: usize,
        dealer_card: Option<Card>,
        players: BTreeMap<SeatId, Seat>,
        war_round: Option<WarRound>,
        message: String,
    },
    ResultAssigned {
        player_id: SeatId,
        result: Outcome,
        player_results: BTreeMap<SeatId, Outcome>,
    },
    BetsChanged {
        min_bet: u32,
        max_bet: u32,
    },
    TableChanged {
        table_number: u32,
    },
    GameReset {
        game_state: GameSnapshot,
    },
    AllPlayerStats {
        stats: BTreeMap<SeatId, SeatTotals>,
    },
    StatsCleared,
    DealerRegistered,
    PlayerRegistered {
        player_id: SeatId,
    },
    Error {
        message: String,
    },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::GameStateUpdate { .. } => "game state update".to_string(),
            Self::DeckShuffled { deck_count, .. } => {
                format!("deck shuffled ({deck_count} cards)")
            }
            Self::CardBurned { burned_card, .. } => format!("burned {burned_card}"),
            Self::PlayerAdded { player_id, .. } => format!("seat {player_id} added"),
            Self::PlayerRemoved { player_id, .. } => format!("seat {player_id} removed"),
            Self::GameModeChanged { mode } => format!("mode changed to {mode}"),
            Self::RoundDealt { round_number, .. } => format!("round {round_number} dealt"),
            Self::CardAssigned {
                target, player_id, ..
            } => match player_id {
                Some(id) => format!("card assigned to seat {id}"),
                None => format!("card assigned to {target}"),
            },
            Self::PlayerChoiceMade { player_id, choice, .. } => {
                format!("seat {player_id} chose {choice}")
            }
            Self::WarRoundStarted { players, .. } => {
                format!("war round started for {} seat(s)", players.len())
            }
            Self::WarCardAssigned {
                target, player_id, ..
            } => match player_id {
                Some(id) => format!("war card assigned to seat {id}"),
                None => format!("war card assigned to {target}"),
            },
            Self::WarRoundEvaluated { .. } => "war round evaluated".to_string(),
            Self::RoundCompleted { round_number, .. } => {
                format!("round {round_number} completed")
            }
            Self::CardsUndone { message, .. } => message.clone(),
            Self::ResultAssigned { player_id, result, .. } => {
                format!("seat {player_id} set to {result}")
            }
            Self::BetsChanged { min_bet, max_bet } => {
                format!("bets changed to {min_bet}/{max_bet}")
            }
            Self::TableChanged { table_number } => format!("now table {table_number}"),
            Self::GameReset { .. } => "game reset".to_string(),
            Self::AllPlayerStats { .. } => "session statistics".to_string(),
            Self::StatsCleared => "session statistics cleared".to_string(),
            Self::DealerRegistered => "dealer registered".to_string(),
            Self::PlayerRegistered { player_id } => format!("seat {player_id} registered"),
            Self::Error { message } => format!("error: {message}"),
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Rank, Suit};

    #[test]
    fn test_events_carry_the_action_discriminator() {
        let event = GameEvent::TableChanged { table_number: 3 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "table_changed");
        assert_eq!(json["table_number"], 3);
    }

    #[test]
    fn test_cards_serialize_as_wire_strings_inside_events() {
        let event = GameEvent::CardBurned {
            burned_card: Card::new(Rank::Ten, Suit::Spade),
            deck_count: 51,
            burned_count: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["burned_card"], "TS");
    }

    #[test]
    fn test_error_event_shape() {
        let event = GameEvent::Error {
            message: "no cards left in the deck, shuffle required".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "error");
        assert!(json["message"].as_str().unwrap().contains("shuffle"));
    }
}
