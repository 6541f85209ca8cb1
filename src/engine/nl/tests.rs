#![cfg(test)]

use crate::cards::{Card, Deck, HandCategory, Rank, Suit};

use super::actions::PlayerAction;
use super::engine::{HandEngine, HandEngineNL, PhaseAdvance, Transition};
use super::errors::ActionError;
use super::state::HandState;
use super::types::*;

fn c(rank: u8, suit: Suit) -> Card {
    Card::new(Rank::from_value(rank).unwrap(), suit)
}

fn stakes(sb: Chips, bb: Chips) -> TableStakes {
    TableStakes {
        small_blind: sb,
        big_blind: bb,
    }
}

fn cfg(button: SeatId, sb: Chips, bb: Chips) -> HandConfig {
    HandConfig {
        stakes: stakes(sb, bb),
        button,
    }
}

fn seats(stacks: &[Chips]) -> Vec<HandSeat> {
    stacks
        .iter()
        .enumerate()
        .map(|(i, &stack)| HandSeat {
            seat: i as SeatId,
            stack,
        })
        .collect()
}

/// Deck that deals the listed cards first and pads with a standard deck
/// behind them, so any post-river draws still succeed.
fn rigged_deck(head: Vec<Card>) -> Deck {
    let mut cards = head.clone();
    let mut rest = Deck::standard();
    for card in rest.draw(52).unwrap() {
        if !head.contains(&card) {
            cards.push(card);
        }
    }
    Deck::from_cards(cards)
}

fn start(
    button: SeatId,
    sb: Chips,
    bb: Chips,
    stacks: &[Chips],
    deck: Deck,
) -> HandState {
    let (state, _blinds) =
        HandEngine::start_hand(cfg(button, sb, bb), &seats(stacks), deck).unwrap();
    state
}

fn apply(state: &mut HandState, seat: SeatId, action: PlayerAction) -> Transition {
    HandEngine::apply_action(state, seat, action).unwrap()
}

fn total_chips(state: &HandState) -> Chips {
    state.players.iter().map(|p| p.stack).sum::<Chips>() + state.pot
}

#[test]
fn heads_up_dealer_posts_small_blind_and_acts_first_preflop() {
    let state = start(0, 10, 20, &[1000, 1000], Deck::standard());
    assert_eq!(state.small_blind_seat, 0);
    assert_eq!(state.big_blind_seat, 1);
    assert_eq!(state.to_act_seat(), Some(0));
    assert_eq!(state.pot, 30);
    assert_eq!(state.current_bet, 20);
}

#[test]
fn heads_up_fold_to_big_blind_awards_the_pot() {
    // Dealer folds preflop; the big blind collects both blinds.
    let mut state = start(0, 10, 20, &[1000, 1000], Deck::standard());
    let transition = apply(&mut state, 0, PlayerAction::Fold);
    let Transition::HandEnd { result, .. } = transition else {
        panic!("expected hand end, got {transition:?}");
    };
    assert!(!result.showdown);
    assert_eq!(result.winners.len(), 1);
    assert_eq!(result.winners[0].seat, 1);
    assert_eq!(result.winners[0].amount, 30);
    assert!(result.winners[0].ranking.is_none());
    assert_eq!(state.phase, Phase::Complete);
    assert_eq!(state.player(0).unwrap().stack, 990);
    assert_eq!(state.player(1).unwrap().stack, 1010);
}

#[test]
fn preflop_action_starts_left_of_big_blind_three_handed() {
    let state = start(0, 10, 20, &[1000, 1000, 1000], Deck::standard());
    assert_eq!(state.small_blind_seat, 1);
    assert_eq!(state.big_blind_seat, 2);
    assert_eq!(state.to_act_seat(), Some(0));
}

#[test]
fn big_blind_may_check_but_not_call_when_everyone_limps() {
    // Everyone limps to the BB; the BB owes nothing, so the legal set has
    // check and raise but no call.
    let mut state = start(0, 10, 20, &[1000, 1000, 1000], Deck::standard());
    apply(&mut state, 0, PlayerAction::Call);
    apply(&mut state, 1, PlayerAction::Call);
    let legals = HandEngine::legal_actions(&state, 2);
    assert!(legals.check);
    assert_eq!(legals.call, None);
    assert!(legals.raise.is_some(), "BB keeps the option to raise");
    assert!(legals.bet.is_none());

    let transition = apply(&mut state, 2, PlayerAction::Check);
    assert!(matches!(transition, Transition::StreetEnd { .. }));
}

#[test]
fn postflop_action_starts_left_of_the_button() {
    let mut state = start(0, 10, 20, &[1000, 1000, 1000], Deck::standard());
    apply(&mut state, 0, PlayerAction::Call);
    apply(&mut state, 1, PlayerAction::Call);
    apply(&mut state, 2, PlayerAction::Check);
    let advance = HandEngine::advance_phase(&mut state).unwrap();
    let PhaseAdvance::Betting {
        phase, next_to_act, ..
    } = advance
    else {
        panic!("expected a betting street");
    };
    assert_eq!(phase, Phase::Flop);
    assert_eq!(next_to_act, 1);
    assert_eq!(state.community.len(), 3);
    assert_eq!(state.current_bet, 0);
    assert_eq!(state.min_raise, 20);
}

#[test]
fn check_through_to_showdown_highest_hand_wins() {
    // Deal order three-handed with button 0 is seats 1, 2, 0. Seat 1 gets
    // pocket aces, seat 2 kings, seat 0 junk; the dry board changes nothing.
    let deck = rigged_deck(vec![
        c(14, Suit::Spades),   // seat 1
        c(13, Suit::Clubs),    // seat 2
        c(7, Suit::Diamonds),  // seat 0
        c(14, Suit::Hearts),   // seat 1
        c(13, Suit::Diamonds), // seat 2
        c(2, Suit::Clubs),     // seat 0
        c(3, Suit::Hearts),
        c(9, Suit::Spades),
        c(11, Suit::Diamonds),
        c(4, Suit::Clubs),
        c(8, Suit::Hearts),
    ]);
    let mut state = start(0, 10, 20, &[1000, 1000, 1000], deck);
    let before = total_chips(&state);

    apply(&mut state, 0, PlayerAction::Call);
    apply(&mut state, 1, PlayerAction::Call);
    apply(&mut state, 2, PlayerAction::Check);
    for _ in 0..3 {
        let advance = HandEngine::advance_phase(&mut state).unwrap();
        assert!(matches!(advance, PhaseAdvance::Betting { .. }));
        apply(&mut state, 1, PlayerAction::Check);
        apply(&mut state, 2, PlayerAction::Check);
        apply(&mut state, 0, PlayerAction::Check);
    }
    let advance = HandEngine::advance_phase(&mut state).unwrap();
    let PhaseAdvance::Showdown { result } = advance else {
        panic!("expected showdown");
    };
    assert!(result.showdown);
    assert_eq!(result.pot, 60);
    assert_eq!(result.winners.len(), 1);
    assert_eq!(result.winners[0].seat, 1);
    assert_eq!(result.winners[0].amount, 60);
    assert_eq!(
        result.winners[0].ranking.unwrap().category,
        HandCategory::Pair
    );
    assert_eq!(state.player(1).unwrap().stack, 1040);
    assert_eq!(total_chips(&state), before);
}

#[test]
fn multiway_all_in_builds_side_pots_and_splits_them_by_strength() {
    // Contributions end at 200/500/500; the short stack holds the best
    // hand and takes the 600 main pot, the second-best the 600 side pot.
    let deck = rigged_deck(vec![
        c(13, Suit::Spades),  // seat 1 (B)
        c(12, Suit::Diamonds), // seat 2 (C)
        c(14, Suit::Spades),  // seat 0 (A)
        c(13, Suit::Hearts),  // seat 1
        c(12, Suit::Clubs),   // seat 2
        c(14, Suit::Diamonds), // seat 0
        c(2, Suit::Clubs),
        c(7, Suit::Diamonds),
        c(9, Suit::Hearts),
        c(3, Suit::Spades),
        c(11, Suit::Clubs),
    ]);
    let mut state = start(0, 10, 20, &[200, 500, 500], deck);
    let before = total_chips(&state);

    apply(&mut state, 0, PlayerAction::AllIn); // to 200
    apply(&mut state, 1, PlayerAction::AllIn); // to 500
    let transition = apply(&mut state, 2, PlayerAction::AllIn); // call 500
    assert!(matches!(transition, Transition::StreetEnd { .. }));

    for expected in [Phase::Flop, Phase::Turn, Phase::River] {
        let advance = HandEngine::advance_phase(&mut state).unwrap();
        let PhaseAdvance::RunOut { phase, .. } = advance else {
            panic!("expected run-out street");
        };
        assert_eq!(phase, expected);
    }
    let PhaseAdvance::Showdown { result } = HandEngine::advance_phase(&mut state).unwrap()
    else {
        panic!("expected showdown");
    };

    assert_eq!(result.pot, 1200);
    let win = |seat: SeatId| {
        result
            .winners
            .iter()
            .find(|w| w.seat == seat)
            .map(|w| w.amount)
            .unwrap_or(0)
    };
    assert_eq!(win(0), 600);
    assert_eq!(win(1), 600);
    assert_eq!(win(2), 0);
    assert_eq!(state.player(0).unwrap().stack, 600);
    assert_eq!(state.player(1).unwrap().stack, 600);
    assert_eq!(state.player(2).unwrap().stack, 0);
    assert_eq!(total_chips(&state), before);
}

#[test]
fn under_min_all_in_raise_does_not_reopen_action() {
    // A 100 bet sets the raise increment to 100; a 130 all-in raises the
    // price but neither bumps the increment nor lets earlier actors
    // re-raise.
    let mut state = start(0, 10, 20, &[1000, 1000, 1000, 150], Deck::standard());
    apply(&mut state, 3, PlayerAction::Call);
    apply(&mut state, 0, PlayerAction::Call);
    apply(&mut state, 1, PlayerAction::Call);
    apply(&mut state, 2, PlayerAction::Check);
    HandEngine::advance_phase(&mut state).unwrap();

    apply(&mut state, 1, PlayerAction::BetTo { to: 100 });
    assert_eq!(state.min_raise, 100);
    apply(&mut state, 2, PlayerAction::Call);

    // The short stack still gets a raise, collapsed to its all-in total.
    let short = HandEngine::legal_actions(&state, 3);
    assert_eq!(short.raise, Some(130..=130));
    apply(&mut state, 3, PlayerAction::AllIn); // to 130, under the min raise

    assert_eq!(state.current_bet, 130);
    assert_eq!(state.min_raise, 100, "short all-in must not move the minimum");

    // Seat 0 never acted on this street, so it may still raise.
    let fresh = HandEngine::legal_actions(&state, 0);
    assert!(fresh.raise.is_some());
    assert_eq!(fresh.raise.clone().unwrap().start(), &230);
    apply(&mut state, 0, PlayerAction::Fold);

    // Seats 1 and 2 already acted at the old price: call or fold only.
    let reopened = HandEngine::legal_actions(&state, 1);
    assert!(reopened.raise.is_none());
    assert_eq!(reopened.call, Some(30));
    assert_eq!(
        HandEngine::apply_action(&mut state, 1, PlayerAction::RaiseTo { to: 300 }),
        Err(ActionError::RaiseNotReopened)
    );
    apply(&mut state, 1, PlayerAction::Call);
    let transition = apply(&mut state, 2, PlayerAction::Call);
    assert!(matches!(transition, Transition::StreetEnd { .. }));
}

#[test]
fn short_stack_is_offered_an_all_in_sized_bet_on_a_fresh_street() {
    // The big blind has 5 chips behind after posting; on the flop it must
    // still be offered a bet, collapsed to its full stack.
    let mut state = start(0, 10, 20, &[1000, 1000, 25], Deck::standard());
    apply(&mut state, 0, PlayerAction::Call);
    apply(&mut state, 1, PlayerAction::Call);
    apply(&mut state, 2, PlayerAction::Check);
    HandEngine::advance_phase(&mut state).unwrap();

    let short = HandEngine::legal_actions(&state, 2);
    assert_eq!(short.bet, Some(5..=5));
    assert_eq!(short.all_in, Some(5));
    let deep = HandEngine::legal_actions(&state, 1);
    assert_eq!(deep.bet, Some(20..=980));
}

#[test]
fn full_raise_reopens_action_for_earlier_callers() {
    let mut state = start(0, 10, 20, &[1000, 1000, 1000], Deck::standard());
    apply(&mut state, 0, PlayerAction::Call);
    apply(&mut state, 1, PlayerAction::RaiseTo { to: 60 });
    assert_eq!(state.min_raise, 40);
    // Seat 0 called at 20 but the full raise reopens it.
    apply(&mut state, 2, PlayerAction::Call);
    let legals = HandEngine::legal_actions(&state, 0);
    assert!(legals.raise.is_some());
    assert_eq!(legals.raise.unwrap(), 100..=1000);
}

#[test]
fn short_big_blind_still_sets_the_full_bet_to_match() {
    // BB can only post 15 of the 20 blind; callers still owe 20.
    let mut state = start(0, 10, 20, &[1000, 1000, 15], Deck::standard());
    assert_eq!(state.current_bet, 20);
    assert_eq!(state.player(2).unwrap().status, PlayerStatus::AllIn);
    assert_eq!(state.player(2).unwrap().contributed, 15);

    apply(&mut state, 0, PlayerAction::Call);
    let transition = apply(&mut state, 1, PlayerAction::Call);
    assert!(matches!(transition, Transition::StreetEnd { .. }));
    assert_eq!(state.pot, 55);
}

#[test]
fn oversized_call_collapses_to_all_in() {
    let mut state = start(0, 10, 20, &[1000, 1000, 50], Deck::standard());
    apply(&mut state, 0, PlayerAction::RaiseTo { to: 200 });
    apply(&mut state, 1, PlayerAction::Call);
    // Seat 2 calls 200 with 30 behind; it goes all-in for what it has.
    let transition = apply(&mut state, 2, PlayerAction::Call);
    assert!(matches!(transition, Transition::StreetEnd { .. }));
    assert_eq!(state.player(2).unwrap().status, PlayerStatus::AllIn);
    assert_eq!(state.player(2).unwrap().contributed, 50);
}

#[test]
fn rejected_intents_leave_the_state_untouched() {
    let mut state = start(0, 10, 20, &[1000, 1000, 1000], Deck::standard());
    let snapshot = state.clone();

    // Out of turn.
    assert_eq!(
        HandEngine::apply_action(&mut state, 1, PlayerAction::Call),
        Err(ActionError::NotYourTurn)
    );
    // Check while facing the blind.
    assert_eq!(
        HandEngine::apply_action(&mut state, 0, PlayerAction::Check),
        Err(ActionError::CannotCheckFacingBet)
    );
    // Raise below the minimum.
    assert_eq!(
        HandEngine::apply_action(&mut state, 0, PlayerAction::RaiseTo { to: 30 }),
        Err(ActionError::BelowMinimum {
            target: 30,
            min: 40
        })
    );
    // Raise beyond the stack.
    assert_eq!(
        HandEngine::apply_action(&mut state, 0, PlayerAction::RaiseTo { to: 2000 }),
        Err(ActionError::InsufficientChips { target: 2000 })
    );
    // Bet once the round is opened.
    assert_eq!(
        HandEngine::apply_action(&mut state, 0, PlayerAction::BetTo { to: 100 }),
        Err(ActionError::CannotBetWhenOpened)
    );
    assert_eq!(state, snapshot);
}

#[test]
fn chips_are_conserved_through_a_scripted_hand() {
    let mut state = start(0, 10, 20, &[400, 650, 900], Deck::standard());
    let before = total_chips(&state);

    apply(&mut state, 0, PlayerAction::RaiseTo { to: 60 });
    assert_eq!(total_chips(&state), before);
    apply(&mut state, 1, PlayerAction::Call);
    apply(&mut state, 2, PlayerAction::Fold);
    assert_eq!(total_chips(&state), before);
    HandEngine::advance_phase(&mut state).unwrap();

    apply(&mut state, 1, PlayerAction::BetTo { to: 90 });
    apply(&mut state, 0, PlayerAction::RaiseTo { to: 180 });
    assert_eq!(total_chips(&state), before);
    let transition = apply(&mut state, 1, PlayerAction::Fold);
    let Transition::HandEnd { result, .. } = transition else {
        panic!("expected hand end after the fold");
    };
    assert!(!result.showdown);
    assert_eq!(total_chips(&state), before);
}

#[test]
fn exact_ties_split_with_the_odd_chip_going_clockwise_from_the_button() {
    // Seats 0 and 1 both make the king-high straight; the short big blind
    // loses. The 45-chip layer they all fed splits 22/22 with one chip
    // left over for the first tied seat clockwise from the button.
    let deck = rigged_deck(vec![
        c(13, Suit::Diamonds), // seat 1
        c(4, Suit::Hearts),    // seat 2
        c(13, Suit::Clubs),    // seat 0
        c(3, Suit::Diamonds),  // seat 1
        c(5, Suit::Hearts),    // seat 2
        c(3, Suit::Clubs),     // seat 0
        c(9, Suit::Hearts),
        c(10, Suit::Diamonds),
        c(11, Suit::Spades),
        c(12, Suit::Clubs),
        c(2, Suit::Diamonds),
    ]);
    let mut state = start(0, 10, 20, &[1000, 1000, 15], deck);
    let before = total_chips(&state);

    apply(&mut state, 0, PlayerAction::Call);
    apply(&mut state, 1, PlayerAction::Call);
    for _ in 0..3 {
        HandEngine::advance_phase(&mut state).unwrap();
        apply(&mut state, 1, PlayerAction::Check);
        apply(&mut state, 0, PlayerAction::Check);
    }
    let PhaseAdvance::Showdown { result } = HandEngine::advance_phase(&mut state).unwrap()
    else {
        panic!("expected showdown");
    };

    // Pots: 45 across all three seats, then 10 between seats 0 and 1.
    // Seat 1 sits first clockwise from the button, so it takes the odd chip.
    let win = |seat: SeatId| {
        result
            .winners
            .iter()
            .find(|w| w.seat == seat)
            .map(|w| w.amount)
            .unwrap_or(0)
    };
    assert_eq!(win(1), 28);
    assert_eq!(win(0), 27);
    assert_eq!(win(2), 0);
    assert_eq!(
        result.winners.iter().map(|w| w.amount).sum::<Chips>(),
        result.pot
    );
    assert_eq!(state.player(0).unwrap().stack, 1007);
    assert_eq!(state.player(1).unwrap().stack, 1008);
    assert_eq!(total_chips(&state), before);
}

#[test]
fn blinds_all_in_from_posting_skip_straight_to_the_run_out() {
    // Heads-up where both stacks are consumed by the blinds: nobody can
    // act, every street runs out, and the uncalled half of the big blind
    // comes back.
    let mut state = start(0, 10, 20, &[10, 20], Deck::standard());
    assert_eq!(state.to_act, None);
    assert_eq!(state.active_count(), 0);
    assert!(state.round_complete());

    for _ in 0..3 {
        let advance = HandEngine::advance_phase(&mut state).unwrap();
        assert!(matches!(advance, PhaseAdvance::RunOut { .. }));
    }
    let PhaseAdvance::Showdown { result } = HandEngine::advance_phase(&mut state).unwrap()
    else {
        panic!("expected showdown");
    };
    assert_eq!(result.pot, 30);
    let returned: Chips = result.payouts.iter().map(|(_, a)| a).sum();
    assert_eq!(returned, 30);
    assert_eq!(total_chips(&state), 30);
}
