use std::time::Duration;

use crate::engine::nl::types::{Chips, TableStakes};

/// Per-table defaults applied to every room the process creates.
/// None of these are part of the wire protocol; they are process
/// configuration surfaced through the binary's CLI/env flags.
#[derive(Clone, Debug)]
pub struct TableConfig {
    pub starting_stack: Chips,
    pub stakes: TableStakes,
    pub max_seats: usize,
    pub turn_timeout: Duration,
    pub inter_hand_delay: Duration,
    /// Pause between community cards when a hand runs out with no
    /// betting left, so spectators can follow the board.
    pub runout_step: Duration,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            starting_stack: 1000,
            stakes: TableStakes {
                small_blind: 10,
                big_blind: 20,
            },
            max_seats: 6,
            turn_timeout: Duration::from_secs(30),
            inter_hand_delay: Duration::from_secs(6),
            runout_step: Duration::from_secs(1),
        }
    }
}
