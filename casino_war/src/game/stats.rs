//! Running per-seat session counters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entities::{Outcome, SeatId};

/// Lifetime counters for one seat.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatTotals {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub surrenders: u32,
}

/// Win/loss/tie/surrender totals per seat, independent of the round
/// lifecycle. Recorded once per seat per settled round and cleared only
/// by the explicit clear action.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SessionStats {
    totals: BTreeMap<SeatId, SeatTotals>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, seat: SeatId, outcome: Outcome) {
        let totals = self.totals.entry(seat).or_default();
        match outcome {
            Outcome::Win => totals.wins += 1,
            Outcome::Lose => totals.losses += 1,
            Outcome::Tie => totals.ties += 1,
            Outcome::Surrender => totals.surrenders += 1,
        }
    }

    pub fn clear_all(&mut self) {
        self.totals.clear();
    }

    pub fn snapshot(&self) -> BTreeMap<SeatId, SeatTotals> {
        self.totals.clone()
    }
}
