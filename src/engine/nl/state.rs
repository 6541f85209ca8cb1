use crate::cards::{Card, Deck};

use super::errors::{InvariantCheck, StateError};
use super::pots::Contribution;
use super::types::{Chips, HandConfig, Phase, PlayerState, PlayerStatus, SeatId};

/// Volatile state of one hand. Mutated only through the engine; the room
/// controller owns it for the duration of the hand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandState {
    pub cfg: HandConfig,
    pub phase: Phase,
    pub deck: Deck,
    pub community: Vec<Card>,

    pub pot: Chips,
    /// Highest per-street total any seat has committed this round.
    pub current_bet: Chips,
    /// Smallest legal raise increment; the size of the last full raise.
    pub min_raise: Chips,
    pub last_raiser: Option<SeatId>,

    pub small_blind_seat: SeatId,
    pub big_blind_seat: SeatId,

    /// Seats dealt into the hand, in seating order. This is the player order.
    pub players: Vec<PlayerState>,
    /// Index into `players` of the seat to act; `None` once no further
    /// actions will be consumed (run-out, showdown, complete).
    pub to_act: Option<usize>,
}

impl HandState {
    pub fn player(&self, seat: SeatId) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.seat == seat)
    }

    pub fn player_mut(&mut self, seat: SeatId) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| p.seat == seat)
    }

    pub fn seat_index(&self, seat: SeatId) -> Option<usize> {
        self.players.iter().position(|p| p.seat == seat)
    }

    pub fn to_act_seat(&self) -> Option<SeatId> {
        self.to_act.map(|i| self.players[i].seat)
    }

    /// Seats still in contention for the pots (active or all-in).
    pub fn live_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_live()).count()
    }

    /// Seats that can still take actions this hand.
    pub fn active_count(&self) -> usize {
        self.players
            .iter()
            .filter(|p| p.status == PlayerStatus::Active)
            .count()
    }

    pub fn contributions(&self) -> Vec<Contribution> {
        self.players
            .iter()
            .map(|p| Contribution {
                seat: p.seat,
                total: p.contributed,
                folded: p.status == PlayerStatus::Folded,
            })
            .collect()
    }

    /// The betting round is closed when every seat that can act has acted
    /// since the last full raise and owes nothing.
    pub fn round_complete(&self) -> bool {
        self.players
            .iter()
            .filter(|p| p.status == PlayerStatus::Active)
            .all(|p| p.acted_this_round && p.round_bet == self.current_bet)
    }
}

impl InvariantCheck for HandState {
    fn validate_invariants(&self) -> Result<(), StateError> {
        let contributed: Chips = self.players.iter().map(|p| p.contributed).sum();
        if contributed != self.pot {
            return Err(StateError::InvariantViolation("pot != sum of contributions"));
        }
        for p in &self.players {
            if p.round_bet > p.contributed {
                return Err(StateError::InvariantViolation("round bet exceeds contribution"));
            }
            if p.round_bet > self.current_bet {
                return Err(StateError::InvariantViolation("round bet exceeds current bet"));
            }
            if p.status == PlayerStatus::AllIn && p.stack != 0 {
                return Err(StateError::InvariantViolation("all-in seat with chips behind"));
            }
        }
        if let Some(idx) = self.to_act {
            let actor = self
                .players
                .get(idx)
                .ok_or(StateError::InvariantViolation("to_act out of range"))?;
            if actor.status != PlayerStatus::Active {
                return Err(StateError::InvariantViolation("to_act on a non-active seat"));
            }
        }
        Ok(())
    }
}
