use crate::cards::{rank_cards, Card, Deck, HandRanking};

use super::actions::PlayerAction;
use super::errors::{ActionError, InvariantCheck, StateError};
use super::events::{BlindKind, BlindPost, NormalizedAction};
use super::legals::{legal_actions, LegalActions};
use super::pots::side_pots;
use super::seating::Seating;
use super::state::HandState;
use super::types::{Chips, HandConfig, HandSeat, Phase, PlayerState, PlayerStatus, SeatId};

/// Outcome of applying one action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Betting continues on this street.
    Continued {
        action: NormalizedAction,
        next_to_act: SeatId,
    },
    /// The betting round closed; the controller advances the phase.
    StreetEnd { action: NormalizedAction },
    /// Everyone else folded; the hand is resolved without a showdown.
    HandEnd {
        action: NormalizedAction,
        result: HandResult,
    },
}

/// Outcome of one phase-advance step. When fewer than two seats can still
/// act the hand runs out street by street: the controller keeps calling
/// [`HandEngineNL::advance_phase`] (pacing the steps however it likes) and
/// no further action intents are consumed in between.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhaseAdvance {
    /// New street with a betting round.
    Betting {
        phase: Phase,
        dealt: Vec<Card>,
        next_to_act: SeatId,
    },
    /// New street with nobody left to act.
    RunOut { phase: Phase, dealt: Vec<Card> },
    /// The river round closed; the hand is resolved.
    Showdown { result: HandResult },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Winner {
    pub seat: SeatId,
    pub amount: Chips,
    /// `None` when the hand ended on folds and no hand was ever shown.
    pub ranking: Option<HandRanking>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandResult {
    /// Every chip return, winnings and uncalled-bet refunds alike,
    /// aggregated per seat. Sums exactly to the pot.
    pub payouts: Vec<(SeatId, Chips)>,
    /// Seats that won an awarded pot.
    pub winners: Vec<Winner>,
    /// Evaluated hands of the live seats; empty without a showdown.
    pub rankings: Vec<(SeatId, HandRanking)>,
    pub showdown: bool,
    pub pot: Chips,
}

pub trait HandEngineNL {
    /// Deal a new hand: seat the entrants, assign positions, deal hole
    /// cards and post blinds. The deck comes in pre-shuffled so a hand is
    /// replayable from a seed.
    fn start_hand(
        cfg: HandConfig,
        seats: &[HandSeat],
        deck: Deck,
    ) -> Result<(HandState, Vec<BlindPost>), StateError>;

    fn legal_actions(state: &HandState, seat: SeatId) -> LegalActions;

    /// Validate and apply one action for the seat whose turn it is, then
    /// advance the turn. Rejected intents leave the state untouched.
    fn apply_action(
        state: &mut HandState,
        seat: SeatId,
        action: PlayerAction,
    ) -> Result<Transition, ActionError>;

    /// Close the current street and open the next one, dealing community
    /// cards; resolves the hand when the river round has closed.
    fn advance_phase(state: &mut HandState) -> Result<PhaseAdvance, StateError>;

    /// Fold a seat out of turn (leave/disconnect policy). In turn this is
    /// a normal fold; out of turn the seat folds in place and the round
    /// is re-examined, since the fold may have closed it.
    fn force_fold(state: &mut HandState, seat: SeatId)
        -> Result<Option<Transition>, ActionError>;
}

pub struct HandEngine;

impl HandEngineNL for HandEngine {
    fn start_hand(
        cfg: HandConfig,
        seats: &[HandSeat],
        mut deck: Deck,
    ) -> Result<(HandState, Vec<BlindPost>), StateError> {
        if seats.len() < 2 {
            return Err(StateError::NotEnoughPlayers);
        }
        let button_idx = seats
            .iter()
            .position(|s| s.seat == cfg.button)
            .ok_or(StateError::InvariantViolation("button seat not dealt in"))?;

        // One card to each seat, twice around, starting left of the button.
        let n = seats.len();
        let mut hole: Vec<Vec<Card>> = vec![Vec::with_capacity(2); n];
        for _ in 0..2 {
            for offset in 0..n {
                let idx = (button_idx + 1 + offset) % n;
                let card = deck.draw(1).ok_or(StateError::DeckExhausted)?[0];
                hole[idx].push(card);
            }
        }

        let players: Vec<PlayerState> = seats
            .iter()
            .zip(hole.into_iter())
            .map(|(s, cards)| PlayerState {
                seat: s.seat,
                stack: s.stack,
                round_bet: 0,
                contributed: 0,
                status: PlayerStatus::Active,
                acted_this_round: false,
                hole_cards: [cards[0], cards[1]],
            })
            .collect();

        // Heads-up: the dealer posts the small blind and acts first preflop.
        let (sb_idx, bb_idx) = if n == 2 {
            (button_idx, (button_idx + 1) % n)
        } else {
            (((button_idx + 1) % n), ((button_idx + 2) % n))
        };

        let mut state = HandState {
            cfg,
            phase: Phase::Preflop,
            deck,
            community: Vec::new(),
            pot: 0,
            current_bet: 0,
            min_raise: cfg.stakes.big_blind,
            last_raiser: None,
            small_blind_seat: players[sb_idx].seat,
            big_blind_seat: players[bb_idx].seat,
            players,
            to_act: None,
        };

        let blinds = vec![
            post_blind(&mut state, sb_idx, BlindKind::Small, cfg.stakes.small_blind),
            post_blind(&mut state, bb_idx, BlindKind::Big, cfg.stakes.big_blind),
        ];

        // The bet to match is the full big blind even when the big blind
        // posted short; the preflop raise anchor is the big blind.
        state.current_bet = cfg.stakes.big_blind;
        state.min_raise = cfg.stakes.big_blind;
        state.last_raiser = Some(state.big_blind_seat);
        state.to_act = state.first_to_act(Phase::Preflop);
        state.validate_invariants()?;
        Ok((state, blinds))
    }

    fn legal_actions(state: &HandState, seat: SeatId) -> LegalActions {
        legal_actions(state, seat)
    }

    fn apply_action(
        state: &mut HandState,
        seat: SeatId,
        action: PlayerAction,
    ) -> Result<Transition, ActionError> {
        if !state.phase.is_betting() {
            return Err(ActionError::HandOver);
        }
        let idx = state.seat_index(seat).ok_or(ActionError::UnknownSeat)?;
        if state.to_act != Some(idx) {
            return Err(ActionError::NotYourTurn);
        }
        if state.players[idx].status != PlayerStatus::Active {
            return Err(ActionError::CannotAct);
        }

        let price = state.current_bet - state.players[idx].round_bet;
        let normalized = match action {
            PlayerAction::Fold => {
                state.players[idx].status = PlayerStatus::Folded;
                NormalizedAction::Fold
            }
            PlayerAction::Check => {
                if price > 0 {
                    return Err(ActionError::CannotCheckFacingBet);
                }
                NormalizedAction::Check
            }
            PlayerAction::Call => {
                if price == 0 {
                    return Err(ActionError::NothingToCall);
                }
                // An oversized call silently collapses to all-in.
                let amount = price.min(state.players[idx].stack);
                commit(state, idx, amount);
                let full = amount == price;
                if state.players[idx].status == PlayerStatus::AllIn {
                    NormalizedAction::AllInCall { amount, full }
                } else {
                    NormalizedAction::Call { amount, full }
                }
            }
            PlayerAction::BetTo { to } => {
                if state.current_bet > 0 {
                    return Err(ActionError::CannotBetWhenOpened);
                }
                apply_open(state, idx, to, false)?
            }
            PlayerAction::RaiseTo { to } => {
                if state.current_bet == 0 {
                    return Err(ActionError::CannotRaiseUnopened);
                }
                if state.players[idx].acted_this_round {
                    return Err(ActionError::RaiseNotReopened);
                }
                apply_raise(state, idx, to, false)?
            }
            PlayerAction::AllIn => {
                let to = state.players[idx].round_bet + state.players[idx].stack;
                if state.current_bet == 0 {
                    apply_open(state, idx, to, true)?
                } else if to <= state.current_bet {
                    let amount = state.players[idx].stack;
                    commit(state, idx, amount);
                    NormalizedAction::AllInCall {
                        amount,
                        full: to == state.current_bet,
                    }
                } else {
                    apply_raise(state, idx, to, true)?
                }
            }
        };
        state.players[idx].acted_this_round = true;

        if state.live_count() == 1 {
            let result = resolve_folds(state)?;
            return Ok(Transition::HandEnd {
                action: normalized,
                result,
            });
        }
        if state.round_complete() {
            state.to_act = None;
            state.validate_invariants()?;
            return Ok(Transition::StreetEnd { action: normalized });
        }
        let next = state
            .next_active_after(idx)
            .ok_or(StateError::InvariantViolation("no active seat to act"))?;
        state.to_act = Some(next);
        state.validate_invariants()?;
        Ok(Transition::Continued {
            action: normalized,
            next_to_act: state.players[next].seat,
        })
    }

    fn advance_phase(state: &mut HandState) -> Result<PhaseAdvance, StateError> {
        let next = match state.phase {
            Phase::Preflop => Phase::Flop,
            Phase::Flop => Phase::Turn,
            Phase::Turn => Phase::River,
            Phase::River => {
                let result = resolve_showdown(state)?;
                return Ok(PhaseAdvance::Showdown { result });
            }
            phase => return Err(StateError::InvalidTransition(phase)),
        };

        for p in state.players.iter_mut() {
            p.round_bet = 0;
            p.acted_this_round = false;
        }
        state.current_bet = 0;
        state.min_raise = state.cfg.stakes.big_blind;
        state.last_raiser = None;

        let count = match next {
            Phase::Flop => 3,
            _ => 1,
        };
        let dealt = state.deck.draw(count).ok_or(StateError::DeckExhausted)?;
        state.community.extend_from_slice(&dealt);
        state.phase = next;

        // With fewer than two seats able to act, the street is dealt
        // without a betting round and the caller advances again.
        if state.active_count() >= 2 {
            state.to_act = state.first_to_act(next);
            state.validate_invariants()?;
            let next_to_act = state
                .to_act_seat()
                .ok_or(StateError::InvariantViolation("no first to act"))?;
            Ok(PhaseAdvance::Betting {
                phase: next,
                dealt,
                next_to_act,
            })
        } else {
            state.to_act = None;
            state.validate_invariants()?;
            Ok(PhaseAdvance::RunOut { phase: next, dealt })
        }
    }

    fn force_fold(
        state: &mut HandState,
        seat: SeatId,
    ) -> Result<Option<Transition>, ActionError> {
        if !state.phase.is_betting() {
            return Err(ActionError::HandOver);
        }
        let idx = state.seat_index(seat).ok_or(ActionError::UnknownSeat)?;
        if state.players[idx].status != PlayerStatus::Active {
            return Err(ActionError::CannotAct);
        }
        if state.to_act == Some(idx) {
            return Self::apply_action(state, seat, PlayerAction::Fold).map(Some);
        }

        state.players[idx].status = PlayerStatus::Folded;
        state.validate_invariants()?;
        if state.live_count() == 1 {
            let result = resolve_folds(state)?;
            return Ok(Some(Transition::HandEnd {
                action: NormalizedAction::Fold,
                result,
            }));
        }
        if state.round_complete() {
            state.to_act = None;
            return Ok(Some(Transition::StreetEnd {
                action: NormalizedAction::Fold,
            }));
        }
        Ok(None)
    }
}

/// Move `amount` of a seat's stack into the pot bookkeeping. Flips the
/// seat to all-in when it empties the stack.
fn commit(state: &mut HandState, idx: usize, amount: Chips) {
    let p = &mut state.players[idx];
    debug_assert!(amount <= p.stack);
    p.stack -= amount;
    p.round_bet += amount;
    p.contributed += amount;
    state.pot += amount;
    if p.stack == 0 {
        p.status = PlayerStatus::AllIn;
    }
}

fn post_blind(state: &mut HandState, idx: usize, kind: BlindKind, amount: Chips) -> BlindPost {
    let posted = amount.min(state.players[idx].stack);
    commit(state, idx, posted);
    BlindPost {
        seat: state.players[idx].seat,
        kind,
        amount: posted,
    }
}

/// Opening bet (`current_bet == 0`). The minimum total is the big blind;
/// an all-in below it is allowed but does not reopen the action.
fn apply_open(
    state: &mut HandState,
    idx: usize,
    to: Chips,
    via_all_in: bool,
) -> Result<NormalizedAction, ActionError> {
    let p = &state.players[idx];
    if to <= p.round_bet {
        return Err(ActionError::BelowMinimum {
            target: to,
            min: state.cfg.stakes.big_blind,
        });
    }
    let needed = to - p.round_bet;
    if needed > p.stack {
        return Err(ActionError::InsufficientChips { target: to });
    }
    let is_all_in = needed == p.stack;
    let min = state.cfg.stakes.big_blind;
    if to < min && !is_all_in {
        return Err(ActionError::BelowMinimum { target: to, min });
    }

    commit(state, idx, needed);
    state.current_bet = to;
    if to >= min {
        // A full opening bet sets the raise increment and reopens action.
        state.min_raise = to;
        state.last_raiser = Some(state.players[idx].seat);
        reopen_action(state, idx);
    }
    Ok(if is_all_in || via_all_in {
        NormalizedAction::AllInBet { to }
    } else {
        NormalizedAction::Bet { to }
    })
}

/// Raise to a street total of `to`. Under the minimum is allowed only as
/// an all-in, and then neither the raise increment nor the acted flags
/// reset, so seats that already acted cannot re-raise.
fn apply_raise(
    state: &mut HandState,
    idx: usize,
    to: Chips,
    via_all_in: bool,
) -> Result<NormalizedAction, ActionError> {
    let p = &state.players[idx];
    if to <= state.current_bet {
        return Err(ActionError::BelowMinimum {
            target: to,
            min: state.current_bet + state.min_raise,
        });
    }
    let needed = to - p.round_bet;
    if needed > p.stack {
        return Err(ActionError::InsufficientChips { target: to });
    }
    let is_all_in = needed == p.stack;
    let min_to = state.current_bet + state.min_raise;
    if to < min_to && !is_all_in {
        return Err(ActionError::BelowMinimum {
            target: to,
            min: min_to,
        });
    }

    let by = to - state.current_bet;
    let full = by >= state.min_raise;
    commit(state, idx, needed);
    state.current_bet = to;
    if full {
        state.min_raise = by;
        state.last_raiser = Some(state.players[idx].seat);
        reopen_action(state, idx);
    }
    Ok(if is_all_in || via_all_in {
        NormalizedAction::AllInRaise { to, by, full }
    } else {
        NormalizedAction::Raise { to, by, full }
    })
}

/// A full bet or raise reopens the street: everyone but the aggressor must
/// act again at the new price.
fn reopen_action(state: &mut HandState, aggressor_idx: usize) {
    for (i, p) in state.players.iter_mut().enumerate() {
        if i != aggressor_idx {
            p.acted_this_round = false;
        }
    }
}

/// Resolution when a single live seat remains: the whole pot goes to it
/// without any evaluation.
fn resolve_folds(state: &mut HandState) -> Result<HandResult, StateError> {
    let winner = state
        .players
        .iter()
        .find(|p| p.is_live())
        .map(|p| p.seat)
        .ok_or(StateError::InvariantViolation("no live seat at resolution"))?;
    let pot = state.pot;
    let result = HandResult {
        payouts: vec![(winner, pot)],
        winners: vec![Winner {
            seat: winner,
            amount: pot,
            ranking: None,
        }],
        rankings: Vec::new(),
        showdown: false,
        pot,
    };
    settle(state, &result)?;
    Ok(result)
}

/// Showdown resolution: evaluate each live seat once, then award each side
/// pot to the best eligible hand. Ties split evenly; the odd chip goes to
/// the first tied seat clockwise from the dealer. A final pot with exactly
/// one eligible seat is an uncalled bet and is returned unevaluated.
fn resolve_showdown(state: &mut HandState) -> Result<HandResult, StateError> {
    state.phase = Phase::Showdown;
    state.to_act = None;

    let mut rankings: Vec<(SeatId, HandRanking)> = Vec::new();
    for p in state.players.iter().filter(|p| p.is_live()) {
        let mut cards = p.hole_cards.to_vec();
        cards.extend_from_slice(&state.community);
        let ranking = rank_cards(&cards)
            .map_err(|_| StateError::InvariantViolation("short board at showdown"))?;
        rankings.push((p.seat, ranking));
    }

    let pots = side_pots(&state.contributions());
    let mut payouts: Vec<(SeatId, Chips)> = Vec::new();
    let mut winners: Vec<Winner> = Vec::new();
    let credit = |list: &mut Vec<(SeatId, Chips)>, seat: SeatId, amount: Chips| {
        match list.iter_mut().find(|(s, _)| *s == seat) {
            Some((_, total)) => *total += amount,
            None => list.push((seat, amount)),
        }
    };

    for pot in &pots {
        if pot.eligible.len() == 1 {
            // Uncalled bet: returned, not won.
            credit(&mut payouts, pot.eligible[0], pot.amount);
            continue;
        }
        let best = pot
            .eligible
            .iter()
            .filter_map(|seat| rankings.iter().find(|(s, _)| s == seat))
            .map(|(_, r)| r.score)
            .max()
            .ok_or(StateError::InvariantViolation("pot with no ranked seats"))?;
        let tied = clockwise_from_button(state, |seat| {
            pot.eligible.contains(&seat)
                && rankings
                    .iter()
                    .any(|(s, r)| *s == seat && r.score == best)
        });
        let share = pot.amount / tied.len() as Chips;
        let odd = pot.amount % tied.len() as Chips;
        for (i, &seat) in tied.iter().enumerate() {
            let amount = share + if i == 0 { odd } else { 0 };
            credit(&mut payouts, seat, amount);
            let ranking = rankings
                .iter()
                .find(|(s, _)| *s == seat)
                .map(|(_, r)| *r);
            match winners.iter_mut().find(|w| w.seat == seat) {
                Some(w) => w.amount += amount,
                None => winners.push(Winner {
                    seat,
                    amount,
                    ranking,
                }),
            }
        }
    }

    let result = HandResult {
        payouts,
        winners,
        rankings,
        showdown: true,
        pot: state.pot,
    };
    settle(state, &result)?;
    Ok(result)
}

/// Seats matching `keep`, ordered clockwise starting left of the button.
fn clockwise_from_button(state: &HandState, keep: impl Fn(SeatId) -> bool) -> Vec<SeatId> {
    let n = state.players.len();
    let button_idx = state
        .seat_index(state.cfg.button)
        .unwrap_or(0);
    (1..=n)
        .map(|step| state.players[(button_idx + step) % n].seat)
        .filter(|&seat| keep(seat))
        .collect()
}

/// Pay the awards out into the stacks and close the hand. Chip conservation
/// is checked before the state is touched.
fn settle(state: &mut HandState, result: &HandResult) -> Result<(), StateError> {
    let awarded: Chips = result.payouts.iter().map(|(_, amount)| amount).sum();
    if awarded != state.pot {
        return Err(StateError::InvariantViolation("payouts do not sum to the pot"));
    }
    for &(seat, amount) in &result.payouts {
        let p = state
            .player_mut(seat)
            .ok_or(StateError::InvariantViolation("payout to unknown seat"))?;
        p.stack += amount;
    }
    // The pot has been paid out; the hand's books are closed.
    state.pot = 0;
    for p in state.players.iter_mut() {
        p.round_bet = 0;
        p.contributed = 0;
    }
    state.phase = Phase::Complete;
    state.to_act = None;
    Ok(())
}
