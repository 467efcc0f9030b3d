//! Property-based tests for the invariants that must survive arbitrary
//! play: rank-only comparison and 52-card conservation.

use proptest::prelude::*;
use std::cmp::Ordering;

use casino_war::{
    WarState,
    entities::{Card, GameMode, GameSnapshot, Rank, SeatId, SeatStatus, Suit, WarChoice},
};

fn rank_strategy() -> impl Strategy<Value = Rank> {
    prop::sample::select(Rank::ALL.to_vec())
}

fn suit_strategy() -> impl Strategy<Value = Suit> {
    prop::sample::select(Suit::ALL.to_vec())
}

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

proptest! {
    /// Suit never influences a comparison.
    #[test]
    fn prop_comparison_ignores_suits(
        rank_a in rank_strategy(),
        rank_b in rank_strategy(),
        suit_a in suit_strategy(),
        suit_b in suit_strategy(),
    ) {
        let a = Card::new(rank_a, suit_a);
        let b = Card::new(rank_b, suit_b);
        prop_assert_eq!(a.compare(b), rank_a.value().cmp(&rank_b.value()));
        // Antisymmetry regardless of suits.
        prop_assert_eq!(a.compare(b), b.compare(a).reverse());
    }

    /// Equal ranks always tie, whatever the suits.
    #[test]
    fn prop_equal_rank_is_always_a_tie(
        rank in rank_strategy(),
        suit_a in suit_strategy(),
        suit_b in suit_strategy(),
    ) {
        let a = Card::new(rank, suit_a);
        let b = Card::new(rank, suit_b);
        prop_assert_eq!(a.compare(b), Ordering::Equal);
    }

    /// Random burns on a fresh shoe never create or destroy cards.
    #[test]
    fn prop_burning_conserves_the_shoe(burns in 0usize..52) {
        let mut state = WarState::default();
        state.shuffle_deck().unwrap();
        for _ in 0..burns {
            state.burn_card().unwrap();
        }
        let snapshot = state.snapshot();
        prop_assert_eq!(snapshot.deck_count, 52 - burns);
        prop_assert_eq!(snapshot.burned_count, burns);
    }

    /// Whole automatic rounds, with every tie sent to war, keep the
    /// 52-card invariant and settle every seat exactly once.
    #[test]
    fn prop_automatic_rounds_conserve_and_settle(
        seat_count in 1u8..=6,
        rounds in 1usize..4,
    ) {
        let mut state = WarState::default();
        state.set_game_mode(GameMode::Automatic).unwrap();
        for n in 1..=seat_count {
            state.add_player(SeatId::new(n)).unwrap();
        }
        for _ in 0..rounds {
            state.shuffle_deck().unwrap();
            state.start_auto_round().unwrap();
            // Resolve any ties by war; automatic mode then finishes the
            // round on its own.
            let waiting: Vec<SeatId> = state
                .snapshot()
                .players
                .iter()
                .filter(|(_, s)| s.status == SeatStatus::WaitingChoice)
                .map(|(id, _)| *id)
                .collect();
            for id in waiting {
                state.player_choice(id, WarChoice::War).unwrap();
            }
            prop_assert!(!state.round_active());

            let snapshot = state.snapshot();
            prop_assert_eq!(
                snapshot.deck_count + snapshot.burned_count + cards_on_table(&snapshot),
                52
            );
            for seat in snapshot.players.values() {
                prop_assert_eq!(seat.status, SeatStatus::Finished);
                prop_assert!(seat.result.is_some());
            }
        }
        // One stat recorded per seat per round, whatever happened.
        let stats = state.session_stats();
        for n in 1..=seat_count {
            let totals = stats[&SeatId::new(n)];
            prop_assert_eq!(
                totals.wins + totals.losses + totals.ties + totals.surrenders,
                rounds as u32
            );
        }
    }
}
