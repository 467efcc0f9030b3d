//! Casino War game state machine.
//!
//! [`WarState`] owns the shoe, the seat map, the war sub-round overlay,
//! and the session statistics, and is the only place game state mutates.
//! Every operation either returns the ordered list of events to broadcast
//! or rejects without touching anything.

use log::debug;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap};

use super::{
    entities::{
        Card, DealTarget, Deck, GameMode, GameSnapshot, OriginalCards, Outcome, Seat, SeatId,
        SeatStatus, WarChoice, WarRound,
    },
    errors::GameError,
    events::GameEvent,
    stats::{SeatTotals, SessionStats},
};

/// Table-level game configuration.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSettings {
    pub max_seats: u8,
    pub table_number: u32,
    pub min_bet: u32,
    pub max_bet: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(6, 1, 10, 1000)
    }
}

impl GameSettings {
    #[must_use]
    pub const fn new(max_seats: u8, table_number: u32, min_bet: u32, max_bet: u32) -> Self {
        Self {
            max_seats,
            table_number,
            min_bet,
            max_bet,
        }
    }
}

/// Resting phases of a round. `Dealing` covers everything between the
/// first card of a round and its evaluation; the comparison itself is
/// instantaneous, so "dealt but unresolved" is never observable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundPhase {
    Idle,
    Dealing,
    AwaitingChoices,
    WarActive,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Slot {
    Dealer,
    Seat(SeatId),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AssignStage {
    Initial,
    War,
}

/// One entry of the undo log: a single card placed on a single slot.
#[derive(Clone, Copy, Debug)]
struct Assignment {
    slot: Slot,
    card: Card,
    stage: AssignStage,
}

/// The authoritative game state.
#[derive(Debug)]
pub struct WarState {
    settings: GameSettings,
    mode: GameMode,
    deck: Deck,
    dealer_card: Option<Card>,
    seats: BTreeMap<SeatId, Seat>,
    phase: RoundPhase,
    round_number: u64,
    /// Last settled result per seat, kept across rounds for the display
    /// board and overwritten at each settlement.
    player_results: BTreeMap<SeatId, Outcome>,
    /// Snapshot of `player_results` taken when the round began, so undo
    /// can restore the pre-evaluation values exactly.
    results_at_round_start: BTreeMap<SeatId, Outcome>,
    war: Option<WarRound>,
    assignments: Vec<Assignment>,
    stats: SessionStats,
    min_bet: u32,
    max_bet: u32,
    table_number: u32,
}

impl Default for WarState {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}

impl WarState {
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            mode: GameMode::Manual,
            deck: Deck::new(),
            dealer_card: None,
            seats: BTreeMap::new(),
            phase: RoundPhase::Idle,
            round_number: 0,
            player_results: BTreeMap::new(),
            results_at_round_start: BTreeMap::new(),
            war: None,
            assignments: Vec::new(),
            stats: SessionStats::new(),
            min_bet: settings.min_bet,
            max_bet: settings.max_bet,
            table_number: settings.table_number,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn round_active(&self) -> bool {
        self.phase != RoundPhase::Idle
    }

    pub fn round_number(&self) -> u64 {
        self.round_number
    }

    pub fn session_stats(&self) -> BTreeMap<SeatId, SeatTotals> {
        self.stats.snapshot()
    }

    /// The canonical full snapshot, the single source of truth clients
    /// fall back to whenever a delta is not enough.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            deck_count: self.deck.remaining(),
            burned_count: self.deck.burned(),
            dealer_card: self.dealer_card,
            players: self.seats.clone(),
            round_active: self.round_active(),
            round_number: self.round_number,
            game_mode: self.mode,
            table_number: self.table_number,
            min_bet: self.min_bet,
            max_bet: self.max_bet,
            player_results: self.player_results.clone(),
            war_round: self.war.clone(),
        }
    }

    // Seat management

    pub fn add_player(&mut self, seat_id: SeatId) -> Result<Vec<GameEvent>, GameError> {
        if seat_id.get() == 0 || seat_id.get() > self.settings.max_seats {
            return Err(GameError::SeatOutOfBounds(seat_id, self.settings.max_seats));
        }
        if self.seats.contains_key(&seat_id) {
            return Err(GameError::SeatOccupied(seat_id));
        }
        if self.round_active() {
            return Err(GameError::RoundActive);
        }
        self.seats.insert(seat_id, Seat::default());
        Ok(vec![GameEvent::PlayerAdded {
            player_id: seat_id,
            players: self.seats.clone(),
        }])
    }

    /// Remove a seat. Mid-round the seat is dropped from the pending and
    /// war sets immediately so the round can still settle without it.
    pub fn remove_player(&mut self, seat_id: SeatId) -> Result<Vec<GameEvent>, GameError> {
        let seat = self
            .seats
            .remove(&seat_id)
            .ok_or(GameError::SeatNotFound(seat_id))?;
        if let Some(card) = seat.card {
            self.deck.discard(card);
        }
        if let Some(card) = seat.war_card {
            self.deck.discard(card);
        }
        let mut war_emptied = false;
        if let Some(war) = &mut self.war {
            if let Some(Some(card)) = war.players.remove(&seat_id) {
                self.deck.discard(card);
            }
            war.original_cards.players.remove(&seat_id);
            war_emptied = war.players.is_empty();
        }
        if war_emptied
            && let Some(war) = self.war.take()
            && let Some(card) = war.dealer_card
        {
            self.deck.discard(card);
        }
        self.player_results.remove(&seat_id);
        self.results_at_round_start.remove(&seat_id);
        self.assignments.retain(|a| a.slot != Slot::Seat(seat_id));

        let mut events = vec![GameEvent::PlayerRemoved {
            player_id: seat_id,
            players: self.seats.clone(),
            player_results: self.player_results.clone(),
        }];
        if self.phase == RoundPhase::AwaitingChoices {
            self.cascade_choices(&mut events);
        } else {
            self.complete_if_finished(&mut events);
        }
        Ok(events)
    }

    // Deck management

    /// Replace the shoe with a fresh permuted 52-card set, excluding any
    /// cards currently on the table, and clear the discard pile. Legal at
    /// any time, including mid-war after the shoe runs dry.
    pub fn shuffle_deck(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let in_play = self.cards_in_play();
        self.deck.shuffle_fresh(&in_play);
        debug!("deck shuffled, {} cards undealt", self.deck.remaining());
        Ok(vec![GameEvent::DeckShuffled {
            deck_count: self.deck.remaining(),
            burned_count: self.deck.burned(),
        }])
    }

    pub fn burn_card(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let burned_card = self.deck.burn()?;
        Ok(vec![GameEvent::CardBurned {
            burned_card,
            deck_count: self.deck.remaining(),
            burned_count: self.deck.burned(),
        }])
    }

    // Mode control

    /// Switch who supplies each card. Rejected while a round is in
    /// flight; the mode never changes under a live round.
    pub fn set_game_mode(&mut self, mode: GameMode) -> Result<Vec<GameEvent>, GameError> {
        if self.round_active() {
            return Err(GameError::ModeChangeDuringRound);
        }
        self.mode = mode;
        Ok(vec![GameEvent::GameModeChanged { mode }])
    }

    // Dealing

    /// Manual-mode trigger: draw a card for every seat and the dealer
    /// from the shoe, then evaluate.
    pub fn deal_cards(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.mode != GameMode::Manual {
            return Err(GameError::WrongMode(self.mode));
        }
        self.deal_full_round()
    }

    /// Automatic-mode trigger: same full deal, but the eventual war
    /// resolution also runs unattended.
    pub fn start_auto_round(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.mode != GameMode::Automatic {
            return Err(GameError::WrongMode(self.mode));
        }
        self.deal_full_round()
    }

    /// Assign one specific card to one unfilled slot. The first card of a
    /// round implicitly starts it.
    pub fn manual_deal_card(
        &mut self,
        target: DealTarget,
        card: Card,
        player_id: Option<SeatId>,
    ) -> Result<Vec<GameEvent>, GameError> {
        if !matches!(self.mode, GameMode::Manual | GameMode::Live) {
            return Err(GameError::WrongMode(self.mode));
        }
        match self.phase {
            RoundPhase::Idle | RoundPhase::Dealing => {}
            RoundPhase::AwaitingChoices | RoundPhase::WarActive => {
                return Err(GameError::AlreadyEvaluated);
            }
        }
        let slot = self.resolve_slot(target, player_id)?;
        // Slots from an earlier, settled round are cleared when this
        // round begins, so only check occupancy mid-deal.
        if self.phase == RoundPhase::Dealing {
            match slot {
                Slot::Dealer if self.dealer_card.is_some() => {
                    return Err(GameError::DealerCardSet);
                }
                Slot::Seat(id) => {
                    if self.seats.get(&id).is_some_and(|s| s.card.is_some()) {
                        return Err(GameError::SeatCardSet(id));
                    }
                }
                Slot::Dealer => {}
            }
        }
        if !self.deck.contains(card) {
            return Err(GameError::CardNotInDeck(card));
        }

        if self.phase == RoundPhase::Idle {
            self.begin_round();
        }
        self.deck.take(card)?;
        match slot {
            Slot::Dealer => self.dealer_card = Some(card),
            Slot::Seat(id) => {
                if let Some(seat) = self.seats.get_mut(&id) {
                    seat.card = Some(card);
                }
            }
        }
        self.assignments.push(Assignment {
            slot,
            card,
            stage: AssignStage::Initial,
        });
        let mut events = vec![GameEvent::CardAssigned {
            target,
            player_id,
            card,
            deck_count: self.deck.remaining(),
        }];
        if self.mode == GameMode::Live {
            events.push(GameEvent::GameStateUpdate {
                game_state: self.snapshot(),
            });
        }
        Ok(events)
    }

    /// Compare every seat's card against the dealer's. Ties move to
    /// `waiting_choice`; everything else settles on the spot.
    pub fn evaluate_round(&mut self) -> Result<Vec<GameEvent>, GameError> {
        match self.phase {
            RoundPhase::Idle => return Err(GameError::RoundNotActive),
            RoundPhase::Dealing => {}
            RoundPhase::AwaitingChoices | RoundPhase::WarActive => {
                return Err(GameError::AlreadyEvaluated);
            }
        }
        if self.dealer_card.is_none() || self.seats.values().any(|s| s.card.is_none()) {
            return Err(GameError::CardsUnassigned);
        }
        let mut events = Vec::new();
        self.evaluate_initial(&mut events);
        Ok(events)
    }

    // War flow

    /// A tied seat picks war or surrender. Once the last pending seat has
    /// chosen, the round either settles, opens an operator-driven war
    /// round, or (automatic mode) resolves the war unattended.
    pub fn player_choice(
        &mut self,
        seat_id: SeatId,
        choice: WarChoice,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != RoundPhase::AwaitingChoices {
            return Err(GameError::NotAwaitingChoice(seat_id));
        }
        let seat = self
            .seats
            .get_mut(&seat_id)
            .ok_or(GameError::SeatNotFound(seat_id))?;
        if seat.status != SeatStatus::WaitingChoice {
            return Err(GameError::NotAwaitingChoice(seat_id));
        }
        match choice {
            WarChoice::Surrender => {
                seat.result = Some(Outcome::Surrender);
                seat.status = SeatStatus::Finished;
            }
            WarChoice::War => seat.status = SeatStatus::War,
        }
        if choice == WarChoice::Surrender {
            self.player_results.insert(seat_id, Outcome::Surrender);
        }
        let mut events = vec![GameEvent::PlayerChoiceMade {
            player_id: seat_id,
            choice,
            players: self.seats.clone(),
            player_results: self.player_results.clone(),
        }];
        self.cascade_choices(&mut events);
        Ok(events)
    }

    /// Fill one war slot with a specific card.
    pub fn assign_war_card(
        &mut self,
        target: DealTarget,
        card: Card,
        player_id: Option<SeatId>,
    ) -> Result<Vec<GameEvent>, GameError> {
        let slot = self.resolve_slot(target, player_id)?;
        let Some(war) = &self.war else {
            return Err(GameError::NoWarRound);
        };
        match slot {
            Slot::Dealer if war.dealer_card.is_some() => {
                return Err(GameError::DealerWarCardSet);
            }
            Slot::Seat(id) => match war.players.get(&id) {
                None => return Err(GameError::NotInWar(id)),
                Some(Some(_)) => return Err(GameError::SeatWarCardSet(id)),
                Some(None) => {}
            },
            Slot::Dealer => {}
        }
        if !self.deck.contains(card) {
            return Err(GameError::CardNotInDeck(card));
        }

        self.deck.take(card)?;
        if let Some(war) = &mut self.war {
            match slot {
                Slot::Dealer => war.dealer_card = Some(card),
                Slot::Seat(id) => {
                    war.players.insert(id, Some(card));
                }
            }
        }
        self.assignments.push(Assignment {
            slot,
            card,
            stage: AssignStage::War,
        });
        let mut events = vec![GameEvent::WarCardAssigned {
            target,
            player_id,
            card,
        }];
        if self.mode == GameMode::Live {
            events.push(GameEvent::GameStateUpdate {
                game_state: self.snapshot(),
            });
        }
        Ok(events)
    }

    /// Compare every war card against the dealer's war card. A repeated
    /// tie opens a fresh war sub-round over the still-tied seats.
    pub fn evaluate_war_round(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let Some(war) = &self.war else {
            return Err(GameError::NoWarRound);
        };
        if !war.is_fully_assigned() {
            return Err(GameError::WarCardsUnassigned);
        }
        let mut events = Vec::new();
        self.evaluate_war_internal(&mut events);
        Ok(events)
    }

    // Corrections

    /// Reverse exactly the last single-card assignment: the card goes
    /// back on top of the shoe and the slot empties. Undoing an initial
    /// card after evaluation also rewinds the derived tie/war state back
    /// to the dealing phase. A compared war level is a commit point and
    /// cannot be unwound; neither can a settled round.
    pub fn undo_last_card(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.phase == RoundPhase::Idle {
            return Err(GameError::NothingToUndo);
        }
        let Some(last) = self.assignments.pop() else {
            return Err(GameError::NothingToUndo);
        };
        let message = match (last.stage, last.slot) {
            (AssignStage::War, Slot::Dealer) => {
                if let Some(war) = &mut self.war {
                    war.dealer_card = None;
                }
                format!("war card {} returned to the deck from the dealer", last.card)
            }
            (AssignStage::War, Slot::Seat(id)) => {
                if let Some(war) = &mut self.war {
                    war.players.insert(id, None);
                }
                format!("war card {} returned to the deck from seat {id}", last.card)
            }
            (AssignStage::Initial, Slot::Dealer) => {
                self.dealer_card = None;
                self.rewind_derived_state();
                format!("card {} returned to the deck from the dealer", last.card)
            }
            (AssignStage::Initial, Slot::Seat(id)) => {
                if let Some(seat) = self.seats.get_mut(&id) {
                    seat.card = None;
                    seat.status = SeatStatus::Active;
                    seat.result = None;
                }
                self.rewind_derived_state();
                format!("card {} returned to the deck from seat {id}", last.card)
            }
        };
        self.deck.put_back(last.card);
        Ok(vec![GameEvent::CardsUndone {
            deck_count: self.deck.remaining(),
            dealer_card: self.dealer_card,
            players: self.seats.clone(),
            war_round: self.war.clone(),
            message,
        }])
    }

    /// Operator override: settle one seat directly. May complete the
    /// round if it was the last undecided seat.
    pub fn manual_assign_result(
        &mut self,
        seat_id: SeatId,
        result: Outcome,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.phase == RoundPhase::Idle {
            return Err(GameError::RoundNotActive);
        }
        let seat = self
            .seats
            .get_mut(&seat_id)
            .ok_or(GameError::SeatNotFound(seat_id))?;
        seat.result = Some(result);
        seat.status = SeatStatus::Finished;
        self.player_results.insert(seat_id, result);
        let mut war_emptied = false;
        if let Some(war) = &mut self.war {
            if let Some(Some(card)) = war.players.remove(&seat_id) {
                self.deck.discard(card);
            }
            war.original_cards.players.remove(&seat_id);
            war_emptied = war.players.is_empty();
        }
        if war_emptied
            && let Some(war) = self.war.take()
            && let Some(card) = war.dealer_card
        {
            self.deck.discard(card);
        }
        let mut events = vec![GameEvent::ResultAssigned {
            player_id: seat_id,
            result,
            player_results: self.player_results.clone(),
        }];
        if self.phase == RoundPhase::AwaitingChoices {
            self.cascade_choices(&mut events);
        } else {
            self.complete_if_finished(&mut events);
        }
        Ok(events)
    }

    // Table management

    /// Keep the seats but clear cards, statuses, results and any war
    /// state, leaving the table ready for the next round.
    pub fn clear_round(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if !matches!(self.mode, GameMode::Automatic | GameMode::Live) {
            return Err(GameError::WrongMode(self.mode));
        }
        self.clear_table();
        self.phase = RoundPhase::Idle;
        self.assignments.clear();
        Ok(vec![GameEvent::GameStateUpdate {
            game_state: self.snapshot(),
        }])
    }

    /// Back to the canonical empty state: empty shoe, no seats, round
    /// zero. Mode, table metadata and session statistics survive.
    /// Calling it twice yields the same state both times.
    pub fn reset_game(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.deck = Deck::new();
        self.dealer_card = None;
        self.seats.clear();
        self.war = None;
        self.phase = RoundPhase::Idle;
        self.round_number = 0;
        self.player_results.clear();
        self.results_at_round_start.clear();
        self.assignments.clear();
        Ok(vec![GameEvent::GameReset {
            game_state: self.snapshot(),
        }])
    }

    pub fn change_bets(&mut self, min_bet: u32, max_bet: u32) -> Result<Vec<GameEvent>, GameError> {
        if min_bet == 0 || min_bet > max_bet {
            return Err(GameError::InvalidBetLimits {
                min: min_bet,
                max: max_bet,
            });
        }
        self.min_bet = min_bet;
        self.max_bet = max_bet;
        Ok(vec![GameEvent::BetsChanged { min_bet, max_bet }])
    }

    pub fn change_table(&mut self, table_number: u32) -> Result<Vec<GameEvent>, GameError> {
        self.table_number = table_number;
        Ok(vec![GameEvent::TableChanged { table_number }])
    }

    pub fn game_state(&self) -> Result<Vec<GameEvent>, GameError> {
        Ok(vec![GameEvent::GameStateUpdate {
            game_state: self.snapshot(),
        }])
    }

    pub fn all_player_stats(&self) -> Result<Vec<GameEvent>, GameError> {
        Ok(vec![GameEvent::AllPlayerStats {
            stats: self.stats.snapshot(),
        }])
    }

    pub fn clear_all_stats(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.stats.clear_all();
        Ok(vec![GameEvent::StatsCleared])
    }

    // Internals

    fn resolve_slot(
        &self,
        target: DealTarget,
        player_id: Option<SeatId>,
    ) -> Result<Slot, GameError> {
        match target {
            DealTarget::Dealer => Ok(Slot::Dealer),
            DealTarget::Player => {
                let id = player_id.ok_or(GameError::MissingPlayerId)?;
                if !self.seats.contains_key(&id) {
                    return Err(GameError::SeatNotFound(id));
                }
                Ok(Slot::Seat(id))
            }
        }
    }

    fn cards_in_play(&self) -> Vec<Card> {
        let mut cards = Vec::new();
        cards.extend(self.dealer_card);
        for seat in self.seats.values() {
            cards.extend(seat.card);
            cards.extend(seat.war_card);
        }
        if let Some(war) = &self.war {
            cards.extend(war.dealer_card);
            for slot in war.players.values() {
                cards.extend(*slot);
            }
        }
        cards
    }

    /// Move every card on the table to the discard pile and reset the
    /// seats, without touching occupancy or the round counter.
    fn clear_table(&mut self) {
        if let Some(card) = self.dealer_card.take() {
            self.deck.discard(card);
        }
        for seat in self.seats.values_mut() {
            if let Some(card) = seat.card.take() {
                self.deck.discard(card);
            }
            if let Some(card) = seat.war_card.take() {
                self.deck.discard(card);
            }
            seat.status = SeatStatus::Active;
            seat.result = None;
        }
        if let Some(war) = self.war.take() {
            if let Some(card) = war.dealer_card {
                self.deck.discard(card);
            }
            for slot in war.players.into_values() {
                if let Some(card) = slot {
                    self.deck.discard(card);
                }
            }
        }
    }

    fn begin_round(&mut self) {
        self.clear_table();
        self.round_number += 1;
        self.phase = RoundPhase::Dealing;
        self.results_at_round_start = self.player_results.clone();
        self.assignments.clear();
        debug!("round {} begins", self.round_number);
    }

    fn deal_full_round(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.round_active() {
            return Err(GameError::RoundActive);
        }
        if self.seats.is_empty() {
            return Err(GameError::NoPlayers);
        }
        if self.deck.remaining() == 0 {
            return Err(GameError::DeckEmpty);
        }
        if self.deck.remaining() < self.seats.len() + 1 {
            return Err(GameError::NotEnoughCards);
        }
        self.begin_round();
        let ids: Vec<SeatId> = self.seats.keys().copied().collect();
        for id in ids {
            let card = self.deck.draw()?;
            if let Some(seat) = self.seats.get_mut(&id) {
                seat.card = Some(card);
            }
            self.assignments.push(Assignment {
                slot: Slot::Seat(id),
                card,
                stage: AssignStage::Initial,
            });
        }
        let card = self.deck.draw()?;
        self.dealer_card = Some(card);
        self.assignments.push(Assignment {
            slot: Slot::Dealer,
            card,
            stage: AssignStage::Initial,
        });
        let mut events = Vec::new();
        self.evaluate_initial(&mut events);
        Ok(events)
    }

    fn evaluate_initial(&mut self, events: &mut Vec<GameEvent>) {
        let Some(dealer_card) = self.dealer_card else {
            return;
        };
        let mut tie_players = Vec::new();
        let mut settled = Vec::new();
        for (id, seat) in &self.seats {
            let Some(card) = seat.card else { continue };
            match card.compare(dealer_card) {
                Ordering::Greater => settled.push((*id, Outcome::Win)),
                Ordering::Less => settled.push((*id, Outcome::Lose)),
                Ordering::Equal => tie_players.push(*id),
            }
        }
        for (id, outcome) in settled {
            if let Some(seat) = self.seats.get_mut(&id) {
                seat.result = Some(outcome);
                seat.status = SeatStatus::Finished;
            }
            self.player_results.insert(id, outcome);
        }
        for id in &tie_players {
            if let Some(seat) = self.seats.get_mut(id) {
                seat.status = SeatStatus::WaitingChoice;
            }
        }
        events.push(GameEvent::RoundDealt {
            round_number: self.round_number,
            dealer_card,
            players: self.seats.clone(),
            tie_players: tie_players.clone(),
            deck_count: self.deck.remaining(),
        });
        if tie_players.is_empty() {
            self.complete_if_finished(events);
        } else {
            self.phase = RoundPhase::AwaitingChoices;
        }
    }

    /// Runs after every choice (and after removals while choices are
    /// pending). Once no seat is undecided: settle, or open the war.
    fn cascade_choices(&mut self, events: &mut Vec<GameEvent>) {
        if self
            .seats
            .values()
            .any(|s| s.status == SeatStatus::WaitingChoice)
        {
            return;
        }
        let pool: Vec<SeatId> = self
            .seats
            .iter()
            .filter(|(_, s)| s.status == SeatStatus::War)
            .map(|(id, _)| *id)
            .collect();
        if pool.is_empty() {
            self.complete_if_finished(events);
            return;
        }
        let original = OriginalCards {
            dealer_card: self.dealer_card,
            players: pool
                .iter()
                .map(|id| (*id, self.seats.get(id).and_then(|s| s.card)))
                .collect(),
        };
        self.start_war(pool, original, events);
        if self.mode == GameMode::Automatic {
            self.run_auto_war(events);
        }
    }

    fn start_war(&mut self, pool: Vec<SeatId>, original: OriginalCards, events: &mut Vec<GameEvent>) {
        let war = WarRound {
            dealer_card: None,
            players: pool.iter().map(|id| (*id, None)).collect(),
            original_cards: original,
        };
        events.push(GameEvent::WarRoundStarted {
            war_round: war.clone(),
            players: pool,
        });
        self.war = Some(war);
        self.phase = RoundPhase::WarActive;
    }

    /// Automatic war resolution: draw for every pool seat and the dealer,
    /// evaluate, and repeat while the war keeps tying. If the shoe runs
    /// short the war round is left unfilled for the operator to rescue
    /// (shuffle, then assign or evaluate by hand).
    fn run_auto_war(&mut self, events: &mut Vec<GameEvent>) {
        loop {
            let Some(war) = &self.war else { break };
            let pool: Vec<SeatId> = war.players.keys().copied().collect();
            if self.deck.remaining() < pool.len() + 1 {
                debug!("shoe too short for automatic war resolution, waiting on the operator");
                break;
            }
            for id in pool {
                let Ok(card) = self.deck.draw() else { return };
                if let Some(war) = &mut self.war {
                    war.players.insert(id, Some(card));
                }
                self.assignments.push(Assignment {
                    slot: Slot::Seat(id),
                    card,
                    stage: AssignStage::War,
                });
            }
            let Ok(card) = self.deck.draw() else { return };
            if let Some(war) = &mut self.war {
                war.dealer_card = Some(card);
            }
            self.assignments.push(Assignment {
                slot: Slot::Dealer,
                card,
                stage: AssignStage::War,
            });
            self.evaluate_war_internal(events);
        }
    }

    fn evaluate_war_internal(&mut self, events: &mut Vec<GameEvent>) {
        let Some(war) = self.war.take() else { return };
        let Some(dealer_card) = war.dealer_card else {
            self.war = Some(war);
            return;
        };
        let mut new_pool = Vec::new();
        let mut participants = Vec::new();
        for (id, slot) in &war.players {
            let Some(card) = *slot else { continue };
            participants.push(*id);
            let Some(seat) = self.seats.get_mut(id) else {
                continue;
            };
            // A repeat tie overwrites the previous level's war card; the
            // displaced card leaves the table for the discard pile.
            if let Some(old) = seat.war_card.take() {
                self.deck.discard(old);
            }
            seat.war_card = Some(card);
            match card.compare(dealer_card) {
                Ordering::Greater => {
                    seat.result = Some(Outcome::Win);
                    seat.status = SeatStatus::Finished;
                }
                Ordering::Less => {
                    seat.result = Some(Outcome::Lose);
                    seat.status = SeatStatus::Finished;
                }
                Ordering::Equal => {
                    seat.status = SeatStatus::War;
                    new_pool.push(*id);
                }
            }
        }
        for id in &participants {
            if let Some(result) = self.seats.get(id).and_then(|s| s.result) {
                self.player_results.insert(*id, result);
            }
        }
        let shown: BTreeMap<SeatId, Seat> = participants
            .iter()
            .filter_map(|id| self.seats.get(id).map(|s| (*id, s.clone())))
            .collect();
        events.push(GameEvent::WarRoundEvaluated {
            dealer_card,
            players: shown,
            player_results: self.player_results.clone(),
        });
        // A compared war level is final: its cards cannot be undone.
        self.assignments.clear();
        self.deck.discard(dealer_card);
        if new_pool.is_empty() {
            self.complete_if_finished(events);
        } else {
            let original = OriginalCards {
                dealer_card: Some(dealer_card),
                players: new_pool
                    .iter()
                    .map(|id| (*id, self.seats.get(id).and_then(|s| s.war_card)))
                    .collect(),
            };
            self.start_war(new_pool, original, events);
        }
    }

    fn complete_if_finished(&mut self, events: &mut Vec<GameEvent>) {
        if self.phase == RoundPhase::Idle {
            return;
        }
        let finished = self
            .seats
            .values()
            .all(|s| s.status == SeatStatus::Finished && s.result.is_some());
        if finished {
            self.complete_round(events);
        }
    }

    fn complete_round(&mut self, events: &mut Vec<GameEvent>) {
        self.phase = RoundPhase::Idle;
        let settled: Vec<(SeatId, Outcome)> = self
            .seats
            .iter()
            .filter_map(|(id, seat)| seat.result.map(|r| (*id, r)))
            .collect();
        for (id, result) in settled {
            self.stats.record(id, result);
        }
        self.assignments.clear();
        debug!("round {} completed", self.round_number);
        events.push(GameEvent::RoundCompleted {
            round_number: self.round_number,
            player_results: self.player_results.clone(),
            stats: self.stats.snapshot(),
        });
    }

    /// An initial card only surfaces at the top of the undo log while no
    /// war cards have been assigned, so removing it invalidates every
    /// comparison derived from the full deal: statuses, results and any
    /// pending war round roll back to the dealing phase.
    fn rewind_derived_state(&mut self) {
        if self.phase == RoundPhase::Dealing {
            return;
        }
        self.war = None;
        for seat in self.seats.values_mut() {
            if seat.card.is_some() {
                seat.status = SeatStatus::Active;
                seat.result = None;
            }
        }
        self.player_results = self.results_at_round_start.clone();
        self.phase = RoundPhase::Dealing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(n: u8) -> SeatId {
        SeatId::new(n)
    }

    #[test]
    fn test_add_player_bounds() {
        let mut state = WarState::default();
        assert!(state.add_player(seat(1)).is_ok());
        assert_eq!(
            state.add_player(seat(1)),
            Err(GameError::SeatOccupied(seat(1)))
        );
        assert_eq!(
            state.add_player(seat(7)),
            Err(GameError::SeatOutOfBounds(seat(7), 6))
        );
        assert_eq!(
            state.add_player(seat(0)),
            Err(GameError::SeatOutOfBounds(seat(0), 6))
        );
    }

    #[test]
    fn test_full_deal_settles_or_waits() {
        let mut state = WarState::default();
        state.add_player(seat(1)).unwrap();
        state.add_player(seat(2)).unwrap();
        state.shuffle_deck().unwrap();
        let events = state.deal_cards().unwrap();
        assert!(matches!(events[0], GameEvent::RoundDealt { .. }));
        let snapshot = state.snapshot();
        assert_eq!(snapshot.deck_count, 49);
        assert!(snapshot.dealer_card.is_some());
        for seat in snapshot.players.values() {
            assert!(seat.card.is_some());
        }
    }

    #[test]
    fn test_deal_requires_shuffled_shoe() {
        let mut state = WarState::default();
        state.add_player(seat(1)).unwrap();
        assert_eq!(state.deal_cards(), Err(GameError::DeckEmpty));
        assert!(!state.round_active());
    }

    #[test]
    fn test_mode_switch_rejected_mid_round() {
        let mut state = WarState::default();
        state.add_player(seat(1)).unwrap();
        state.shuffle_deck().unwrap();
        state
            .manual_deal_card(DealTarget::Dealer, "AS".parse().unwrap(), None)
            .unwrap();
        assert_eq!(
            state.set_game_mode(GameMode::Live),
            Err(GameError::ModeChangeDuringRound)
        );
    }

    #[test]
    fn test_change_bets_validation() {
        let mut state = WarState::default();
        assert_eq!(
            state.change_bets(500, 100),
            Err(GameError::InvalidBetLimits { min: 500, max: 100 })
        );
        assert!(state.change_bets(25, 2500).is_ok());
        let snapshot = state.snapshot();
        assert_eq!(snapshot.min_bet, 25);
        assert_eq!(snapshot.max_bet, 2500);
    }
}
