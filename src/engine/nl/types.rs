use serde::{Deserialize, Serialize};

use crate::cards::Card;

pub type Chips = u64;
/// Position of a seat in the room's seating order. Stable for the duration
/// of one hand; the room layer maps it back to durable seat identities.
pub type SeatId = u8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Complete,
}

impl Phase {
    /// Phases in which the hand consumes player actions.
    pub fn is_betting(self) -> bool {
        matches!(
            self,
            Phase::Preflop | Phase::Flop | Phase::Turn | Phase::River
        )
    }
}

/// Status of a seat that was dealt into the hand. Seats not dealt in are
/// never part of the engine's player set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerStatus {
    /// Can still act this hand.
    Active,
    /// Out of the hand; chips already contributed stay in the pots.
    Folded,
    /// No chips behind; cannot act but remains eligible for pots.
    AllIn,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerState {
    pub seat: SeatId,
    /// Uncommitted chips behind.
    pub stack: Chips,
    /// Committed on the current street.
    pub round_bet: Chips,
    /// Committed across the whole hand; the side-pot basis.
    pub contributed: Chips,
    pub status: PlayerStatus,
    /// Whether this seat has acted since the last full raise. Blind posts
    /// do not count as acting, which is what gives the big blind its option.
    pub acted_this_round: bool,
    pub hole_cards: [Card; 2],
}

impl PlayerState {
    pub fn is_live(&self) -> bool {
        self.status != PlayerStatus::Folded
    }
}

/// Stack a seat brings into the hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandSeat {
    pub seat: SeatId,
    pub stack: Chips,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStakes {
    pub small_blind: Chips,
    pub big_blind: Chips,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandConfig {
    pub stakes: TableStakes,
    /// Dealer button, which must be one of the seats dealt in.
    pub button: SeatId,
}
