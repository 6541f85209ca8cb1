pub mod controller;
pub mod registry;
pub mod seat;
pub mod view;

pub use controller::{RoomCommand, RoomError, RoomHandle};
pub use registry::RoomRegistry;

use crate::engine::nl::{HandState, TableStakes};
use seat::Seat;

/// One table: its durable seats in seating order plus the hand in flight,
/// if any. Owned exclusively by the room's controller task.
#[derive(Clone, Debug)]
pub struct Room {
    pub id: String,
    pub name: String,
    /// Insertion order is seating order; the engine's seat ids are indexes
    /// into this vector, which never shrinks while a hand is in progress.
    pub seats: Vec<Seat>,
    pub max_seats: usize,
    pub stakes: TableStakes,
    pub hand: Option<HandState>,
    pub hand_number: u64,
    /// Durable identity of the current dealer; rotates between hands.
    pub dealer_seat: Option<String>,
}

impl Room {
    pub fn seat(&self, id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == id)
    }

    pub fn seat_index(&self, id: &str) -> Option<usize> {
        self.seats.iter().position(|s| s.id == id)
    }

    pub fn hand_in_progress(&self) -> bool {
        self.hand.is_some()
    }

    /// Seats that can be dealt into the next hand.
    pub fn eligible_indexes(&self) -> Vec<usize> {
        self.seats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.chips > 0)
            .map(|(i, _)| i)
            .collect()
    }
}
