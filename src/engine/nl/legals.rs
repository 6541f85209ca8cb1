use std::ops::RangeInclusive;

use super::state::HandState;
use super::types::{Chips, PlayerStatus, SeatId};

/// Actions a seat may legally take against the current state, with the
/// amounts attached. Ranges for bet/raise are in **total-for-the-street**
/// terms, matching the action intents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegalActions {
    pub fold: bool,
    pub check: bool,
    /// Price to call. Calling more than the stack is permitted and
    /// collapses to all-in on apply, so this is not capped.
    pub call: Option<Chips>,
    /// For bet and raise the range collapses to the seat's all-in total
    /// when the stack cannot cover the minimum; such an under-sized
    /// target is accepted only as an all-in and does not reopen action.
    pub bet: Option<RangeInclusive<Chips>>,
    pub raise: Option<RangeInclusive<Chips>>,
    /// Street total the seat would reach by going all-in.
    pub all_in: Option<Chips>,
}

impl LegalActions {
    pub fn none() -> Self {
        Self {
            fold: false,
            check: false,
            call: None,
            bet: None,
            raise: None,
            all_in: None,
        }
    }
}

/// Derive the legal actions for one seat. A seat that is not active has
/// none. Raising is withheld from a seat that has already acted since the
/// last full raise; an under-sized all-in does not reopen it.
pub fn legal_actions(state: &HandState, seat: SeatId) -> LegalActions {
    let Some(player) = state.player(seat) else {
        return LegalActions::none();
    };
    if !state.phase.is_betting() || player.status != PlayerStatus::Active {
        return LegalActions::none();
    }

    let price = state.current_bet.saturating_sub(player.round_bet);
    let max_total = player.round_bet + player.stack;

    let mut legals = LegalActions::none();
    legals.fold = true;
    legals.check = price == 0;
    if price > 0 && player.stack > 0 {
        legals.call = Some(price);
    }
    if state.current_bet == 0 && player.stack > 0 {
        let min = state.cfg.stakes.big_blind;
        legals.bet = Some(min.min(max_total)..=max_total);
    }
    if state.current_bet > 0 && player.stack > price && !player.acted_this_round {
        let min = state.current_bet + state.min_raise;
        legals.raise = Some(min.min(max_total)..=max_total);
    }
    if player.stack > 0 {
        legals.all_in = Some(max_total);
    }
    legals
}
