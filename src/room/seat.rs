use serde::Serialize;

use crate::engine::nl::Chips;

/// Seat status as shown to clients. `Folded` and `AllIn` mirror the engine
/// while a hand runs; `Waiting` and `Out` exist only between hands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeatStatus {
    Waiting,
    Active,
    Folded,
    AllIn,
    Out,
}

/// Durable identity of a player at the table for the session. Hole cards
/// live in the engine's hand state, never here.
#[derive(Clone, Debug)]
pub struct Seat {
    pub id: String,
    pub name: String,
    pub chips: Chips,
    pub status: SeatStatus,
    /// Connection dropped mid-hand; the turn timer's auto-action covers it
    /// and the seat is released at the hand boundary.
    pub away: bool,
    /// Asked to leave mid-hand; folded immediately, removed at hand end.
    pub leaving: bool,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
}

impl Seat {
    pub fn new(id: String, name: String, chips: Chips) -> Self {
        Self {
            id,
            name,
            chips,
            status: SeatStatus::Waiting,
            away: false,
            leaving: false,
            is_dealer: false,
            is_small_blind: false,
            is_big_blind: false,
        }
    }
}
