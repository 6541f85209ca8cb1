//! Side-pot layering from per-seat hand contributions.

use super::types::{Chips, SeatId};

/// One pot layer. Seats listed in `eligible` (hand seating order) can win
/// it at showdown; folded contributions are counted in `amount` but confer
/// no eligibility.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidePot {
    pub amount: Chips,
    pub eligible: Vec<SeatId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contribution {
    pub seat: SeatId,
    pub total: Chips,
    pub folded: bool,
}

/// Split total contributions into ordered side pots.
///
/// Distinct contribution totals form ascending layers; each layer's amount
/// is the layer size times the number of seats that contributed at least
/// that much. Adjacent layers with identical eligible sets are merged,
/// which also collapses layers introduced only by folded stacks. A final
/// pot with exactly one eligible seat is that seat's uncalled bet.
pub fn side_pots(contributions: &[Contribution]) -> Vec<SidePot> {
    let mut levels: Vec<Chips> = contributions
        .iter()
        .map(|c| c.total)
        .filter(|&t| t > 0)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut pots: Vec<SidePot> = Vec::new();
    let mut prev = 0;
    for level in levels {
        let layer = level - prev;
        let contributors = contributions.iter().filter(|c| c.total >= level).count();
        let eligible: Vec<SeatId> = contributions
            .iter()
            .filter(|c| !c.folded && c.total >= level)
            .map(|c| c.seat)
            .collect();
        let amount = layer * contributors as Chips;
        match pots.last_mut() {
            Some(last) if last.eligible == eligible => last.amount += amount,
            _ => pots.push(SidePot { amount, eligible }),
        }
        prev = level;
    }
    pots
}
