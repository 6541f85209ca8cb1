use super::state::HandState;
use super::types::{Phase, PlayerStatus};

/// Turn-order arithmetic over the hand's seating order.
pub trait Seating {
    /// Index of the next active seat strictly after `from`, wrapping.
    fn next_active_after(&self, from: usize) -> Option<usize>;

    /// First seat to act on a street:
    /// - preflop: left of the big blind (heads-up: the dealer, who is the
    ///   small blind);
    /// - postflop: first active seat clockwise from the dealer.
    fn first_to_act(&self, phase: Phase) -> Option<usize>;
}

impl Seating for HandState {
    fn next_active_after(&self, from: usize) -> Option<usize> {
        let n = self.players.len();
        (1..=n)
            .map(|step| (from + step) % n)
            .find(|&i| self.players[i].status == PlayerStatus::Active)
    }

    fn first_to_act(&self, phase: Phase) -> Option<usize> {
        let anchor = if phase == Phase::Preflop {
            self.seat_index(self.big_blind_seat)?
        } else {
            self.seat_index(self.cfg.button)?
        };
        self.next_active_after(anchor)
    }
}
