//! Integration tests for the round lifecycle: dealing, comparison,
//! settlement, undo, and the reset/clear paths.

use casino_war::{
    GameError, GameEvent, WarState,
    entities::{Card, DealTarget, GameMode, GameSnapshot, Outcome, SeatId, SeatStatus, WarChoice},
};

fn card(s: &str) -> Card {
    s.parse().unwrap()
}

fn seat(n: u8) -> SeatId {
    SeatId::new(n)
}

/// Cards currently on the table according to a snapshot.
fn cards_on_table(snapshot: &GameSnapshot) -> usize {
    let mut count = usize::from(snapshot.dealer_card.is_some());
    for seat in snapshot.players.values() {
        count += usize::from(seat.card.is_some());
        count += usize::from(seat.war_card.is_some());
    }
    if let Some(war) = &snapshot.war_round {
        count += usize::from(war.dealer_card.is_some());
        count += war.players.values().filter(|slot| slot.is_some()).count();
    }
    count
}

/// The 52-card conservation invariant: shoe + discards + table.
fn assert_conserved(state: &WarState) {
    let snapshot = state.snapshot();
    assert_eq!(
        snapshot.deck_count + snapshot.burned_count + cards_on_table(&snapshot),
        52,
        "card conservation violated"
    );
}

fn manual_table(seats: &[u8]) -> WarState {
    let mut state = WarState::default();
    for n in seats {
        state.add_player(seat(*n)).unwrap();
    }
    state.shuffle_deck().unwrap();
    state
}

#[test]
fn test_dealer_high_card_settles_round_immediately() {
    let mut state = manual_table(&[1]);
    state
        .manual_deal_card(DealTarget::Dealer, card("KH"), None)
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("7S"), Some(seat(1)))
        .unwrap();
    let events = state.evaluate_round().unwrap();

    assert!(matches!(events[0], GameEvent::RoundDealt { .. }));
    assert!(matches!(events[1], GameEvent::RoundCompleted { .. }));
    assert!(!state.round_active());

    let snapshot = state.snapshot();
    let player = &snapshot.players[&seat(1)];
    assert_eq!(player.result, Some(Outcome::Lose));
    assert_eq!(player.status, SeatStatus::Finished);
    assert_eq!(state.session_stats()[&seat(1)].losses, 1);
    assert_conserved(&state);
}

#[test]
fn test_tie_blocks_settlement_until_choice() {
    let mut state = manual_table(&[1, 2]);
    state
        .manual_deal_card(DealTarget::Dealer, card("9D"), None)
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("9C"), Some(seat(1)))
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("2H"), Some(seat(2)))
        .unwrap();
    let events = state.evaluate_round().unwrap();

    // Only the deal event; no settlement while a seat is undecided.
    assert_eq!(events.len(), 1);
    let GameEvent::RoundDealt { tie_players, .. } = &events[0] else {
        panic!("expected a round_dealt event");
    };
    assert_eq!(tie_players, &[seat(1)]);

    let snapshot = state.snapshot();
    assert!(snapshot.round_active);
    assert_eq!(
        snapshot.players[&seat(1)].status,
        SeatStatus::WaitingChoice
    );
    assert_eq!(snapshot.players[&seat(2)].result, Some(Outcome::Lose));
    // Stats untouched before settlement.
    assert!(state.session_stats().is_empty());
}

#[test]
fn test_surrender_settles_without_entering_war() {
    let mut state = manual_table(&[1]);
    state
        .manual_deal_card(DealTarget::Dealer, card("5D"), None)
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("5C"), Some(seat(1)))
        .unwrap();
    state.evaluate_round().unwrap();

    let events = state
        .player_choice(seat(1), WarChoice::Surrender)
        .unwrap();
    assert!(matches!(events[0], GameEvent::PlayerChoiceMade { .. }));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, GameEvent::RoundCompleted { .. }))
    );
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, GameEvent::WarRoundStarted { .. }))
    );

    let snapshot = state.snapshot();
    assert_eq!(snapshot.players[&seat(1)].result, Some(Outcome::Surrender));
    assert!(snapshot.war_round.is_none());
    assert_eq!(state.session_stats()[&seat(1)].surrenders, 1);
    assert_conserved(&state);
}

#[test]
fn test_duplicate_card_assignment_rejected() {
    let mut state = manual_table(&[1]);
    state
        .manual_deal_card(DealTarget::Dealer, card("AS"), None)
        .unwrap();
    let err = state
        .manual_deal_card(DealTarget::Player, card("AS"), Some(seat(1)))
        .unwrap_err();
    assert_eq!(err, GameError::CardNotInDeck(card("AS")));

    // The rejected action changed nothing.
    let snapshot = state.snapshot();
    assert_eq!(snapshot.players[&seat(1)].card, None);
    assert_eq!(snapshot.deck_count, 51);
    assert_conserved(&state);
}

#[test]
fn test_deal_on_empty_deck_reports_exhaustion() {
    let mut state = WarState::default();
    state.set_game_mode(GameMode::Automatic).unwrap();
    state.add_player(seat(1)).unwrap();

    // Fresh process: the shoe is empty until the operator shuffles.
    assert_eq!(state.start_auto_round(), Err(GameError::DeckEmpty));
    let snapshot = state.snapshot();
    assert!(!snapshot.round_active);
    assert_eq!(snapshot.dealer_card, None);
    assert_eq!(snapshot.players[&seat(1)].card, None);
}

#[test]
fn test_occupied_slot_guarded() {
    let mut state = manual_table(&[1]);
    state
        .manual_deal_card(DealTarget::Dealer, card("KS"), None)
        .unwrap();
    assert_eq!(
        state.manual_deal_card(DealTarget::Dealer, card("QS"), None),
        Err(GameError::DealerCardSet)
    );
    state
        .manual_deal_card(DealTarget::Player, card("3C"), Some(seat(1)))
        .unwrap();
    assert_eq!(
        state.manual_deal_card(DealTarget::Player, card("4C"), Some(seat(1))),
        Err(GameError::SeatCardSet(seat(1)))
    );
}

#[test]
fn test_undo_is_a_true_inverse_of_one_assignment() {
    let mut state = manual_table(&[1]);
    state
        .manual_deal_card(DealTarget::Dealer, card("TH"), None)
        .unwrap();
    assert_eq!(state.snapshot().deck_count, 51);

    let events = state.undo_last_card().unwrap();
    let GameEvent::CardsUndone {
        deck_count,
        dealer_card,
        ..
    } = &events[0]
    else {
        panic!("expected a cards_undone event");
    };
    assert_eq!(*deck_count, 52);
    assert_eq!(*dealer_card, None);
    assert_conserved(&state);

    // The card went back on top of the shoe and can be assigned again.
    state
        .manual_deal_card(DealTarget::Dealer, card("TH"), None)
        .unwrap();
}

#[test]
fn test_undo_with_nothing_assigned_rejected() {
    let mut state = manual_table(&[1]);
    assert_eq!(state.undo_last_card(), Err(GameError::NothingToUndo));
}

#[test]
fn test_undo_disabled_after_settlement() {
    let mut state = manual_table(&[1]);
    state
        .manual_deal_card(DealTarget::Dealer, card("KH"), None)
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("7S"), Some(seat(1)))
        .unwrap();
    state.evaluate_round().unwrap();
    assert!(!state.round_active());
    assert_eq!(state.undo_last_card(), Err(GameError::NothingToUndo));
}

#[test]
fn test_undo_after_evaluation_rewinds_tie_state() {
    let mut state = manual_table(&[1, 2]);
    state
        .manual_deal_card(DealTarget::Dealer, card("9D"), None)
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("9C"), Some(seat(1)))
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("2H"), Some(seat(2)))
        .unwrap();
    state.evaluate_round().unwrap();
    assert_eq!(
        state.snapshot().players[&seat(1)].status,
        SeatStatus::WaitingChoice
    );

    // Undo the last card (seat 2's). The comparison derived from the
    // full deal no longer holds, so statuses and results roll back.
    state.undo_last_card().unwrap();
    let snapshot = state.snapshot();
    assert_eq!(snapshot.players[&seat(1)].status, SeatStatus::Active);
    assert_eq!(snapshot.players[&seat(1)].result, None);
    assert_eq!(snapshot.players[&seat(2)].card, None);
    assert!(snapshot.player_results.is_empty());
    assert!(snapshot.war_round.is_none());
    assert_conserved(&state);

    // Re-assign and evaluate again: the round can still settle.
    state
        .manual_deal_card(DealTarget::Player, card("KH"), Some(seat(2)))
        .unwrap();
    state.evaluate_round().unwrap();
    state.player_choice(seat(1), WarChoice::Surrender).unwrap();
    assert!(!state.round_active());
    assert_eq!(
        state.snapshot().players[&seat(2)].result,
        Some(Outcome::Win)
    );
}

#[test]
fn test_reset_game_is_idempotent() {
    let mut state = manual_table(&[1, 2]);
    state
        .manual_deal_card(DealTarget::Dealer, card("KH"), None)
        .unwrap();

    state.reset_game().unwrap();
    let first = state.snapshot();
    state.reset_game().unwrap();
    let second = state.snapshot();

    assert_eq!(first, second);
    assert_eq!(first.round_number, 0);
    assert_eq!(first.deck_count, 0);
    assert!(first.players.is_empty());
    assert!(!first.round_active);
}

#[test]
fn test_reset_game_keeps_session_stats() {
    let mut state = manual_table(&[1]);
    state
        .manual_deal_card(DealTarget::Dealer, card("2H"), None)
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("8S"), Some(seat(1)))
        .unwrap();
    state.evaluate_round().unwrap();
    assert_eq!(state.session_stats()[&seat(1)].wins, 1);

    state.reset_game().unwrap();
    assert_eq!(state.session_stats()[&seat(1)].wins, 1);

    state.clear_all_stats().unwrap();
    assert!(state.session_stats().is_empty());
}

#[test]
fn test_snapshot_round_trips_through_json() {
    let mut state = manual_table(&[1, 2]);
    state
        .manual_deal_card(DealTarget::Dealer, card("9D"), None)
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("9C"), Some(seat(1)))
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("2H"), Some(seat(2)))
        .unwrap();
    state.evaluate_round().unwrap();
    state.player_choice(seat(1), WarChoice::War).unwrap();

    let snapshot = state.snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let restored: GameSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, snapshot);
}

#[test]
fn test_add_player_rejected_mid_round() {
    let mut state = manual_table(&[1]);
    state
        .manual_deal_card(DealTarget::Dealer, card("KH"), None)
        .unwrap();
    assert_eq!(state.add_player(seat(2)), Err(GameError::RoundActive));
}

#[test]
fn test_removing_undecided_seat_unblocks_round() {
    let mut state = manual_table(&[1, 2]);
    state
        .manual_deal_card(DealTarget::Dealer, card("9D"), None)
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("9C"), Some(seat(1)))
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("2H"), Some(seat(2)))
        .unwrap();
    state.evaluate_round().unwrap();
    assert!(state.round_active());

    let events = state.remove_player(seat(1)).unwrap();
    assert!(matches!(events[0], GameEvent::PlayerRemoved { .. }));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, GameEvent::RoundCompleted { .. }))
    );
    assert!(!state.round_active());
    assert_conserved(&state);
    // The removed seat's in-flight result is discarded, not recorded.
    assert!(!state.session_stats().contains_key(&seat(1)));
}

#[test]
fn test_manual_result_override_completes_round() {
    let mut state = manual_table(&[1, 2]);
    state
        .manual_deal_card(DealTarget::Dealer, card("9D"), None)
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("9C"), Some(seat(1)))
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("2H"), Some(seat(2)))
        .unwrap();
    state.evaluate_round().unwrap();

    let events = state
        .manual_assign_result(seat(1), Outcome::Tie)
        .unwrap();
    assert!(matches!(events[0], GameEvent::ResultAssigned { .. }));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, GameEvent::RoundCompleted { .. }))
    );
    assert_eq!(state.session_stats()[&seat(1)].ties, 1);
    assert_eq!(state.session_stats()[&seat(2)].losses, 1);
}

#[test]
fn test_evaluate_requires_every_card() {
    let mut state = manual_table(&[1, 2]);
    state
        .manual_deal_card(DealTarget::Dealer, card("9D"), None)
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("4C"), Some(seat(1)))
        .unwrap();
    assert_eq!(state.evaluate_round(), Err(GameError::CardsUnassigned));
    // Seat 2 still has no card; the round stays in the dealing phase.
    assert!(state.round_active());
}

#[test]
fn test_clear_round_keeps_seats_and_round_number() {
    let mut state = WarState::default();
    state.set_game_mode(GameMode::Automatic).unwrap();
    state.add_player(seat(1)).unwrap();
    state.shuffle_deck().unwrap();
    state.start_auto_round().unwrap();
    let before = state.snapshot().round_number;

    // clear_round works regardless of where the round stopped.
    state.clear_round().unwrap();
    let snapshot = state.snapshot();
    assert!(!snapshot.round_active);
    assert_eq!(snapshot.round_number, before);
    assert!(snapshot.players.contains_key(&seat(1)));
    assert_eq!(snapshot.players[&seat(1)].card, None);
    assert_eq!(snapshot.dealer_card, None);
    assert_conserved(&state);
}

#[test]
fn test_clear_round_rejected_in_manual_mode() {
    let mut state = manual_table(&[1]);
    assert_eq!(
        state.clear_round(),
        Err(GameError::WrongMode(GameMode::Manual))
    );
}

#[test]
fn test_shuffle_mid_round_excludes_table_cards() {
    let mut state = manual_table(&[1, 2]);
    state
        .manual_deal_card(DealTarget::Dealer, card("KH"), None)
        .unwrap();
    state
        .manual_deal_card(DealTarget::Player, card("7S"), Some(seat(1)))
        .unwrap();

    state.shuffle_deck().unwrap();
    let snapshot = state.snapshot();
    assert_eq!(snapshot.deck_count, 50);
    assert_eq!(snapshot.burned_count, 0);
    assert_conserved(&state);
    // Cards on the table cannot be dealt a second time.
    assert_eq!(
        state.manual_deal_card(DealTarget::Player, card("KH"), Some(seat(2))),
        Err(GameError::CardNotInDeck(card("KH")))
    );
}

#[test]
fn test_burn_reduces_deck_and_grows_discards() {
    let mut state = manual_table(&[1]);
    let events = state.burn_card().unwrap();
    assert!(matches!(events[0], GameEvent::CardBurned { .. }));
    let snapshot = state.snapshot();
    assert_eq!(snapshot.deck_count, 51);
    assert_eq!(snapshot.burned_count, 1);
    assert_conserved(&state);
}
