use super::types::Chips;

/// Player intent against the current betting round. `BetTo`/`RaiseTo` carry
/// the **total** the seat wants committed on this street after the action,
/// not the increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    Fold,
    Check,
    Call,
    BetTo { to: Chips },
    RaiseTo { to: Chips },
    AllIn,
}
