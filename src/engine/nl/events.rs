use super::types::{Chips, SeatId};

/// What an applied action actually did once chip caps and all-in collapses
/// are accounted for. `full` distinguishes complete calls/raises from
/// short ones that do not reopen the action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormalizedAction {
    Fold,
    Check,
    Call { amount: Chips, full: bool },
    Bet { to: Chips },
    Raise { to: Chips, by: Chips, full: bool },
    AllInCall { amount: Chips, full: bool },
    AllInBet { to: Chips },
    AllInRaise { to: Chips, by: Chips, full: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlindKind {
    Small,
    Big,
}

/// Forced bet posted at hand start, capped by the seat's stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlindPost {
    pub seat: SeatId,
    pub kind: BlindKind,
    pub amount: Chips,
}
