use thiserror::Error;

use super::types::{Chips, Phase};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid transition out of {0:?}")]
    InvalidTransition(Phase),
    #[error("deck exhausted")]
    DeckExhausted,
    #[error("need at least two seats to start a hand")]
    NotEnoughPlayers,
    #[error("invariant violated: {0}")]
    InvariantViolation(&'static str),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("hand is not awaiting actions")]
    HandOver,
    #[error("seat is not in the hand")]
    UnknownSeat,
    #[error("not this seat's turn")]
    NotYourTurn,
    #[error("seat cannot act")]
    CannotAct,
    #[error("cannot check while facing a bet")]
    CannotCheckFacingBet,
    #[error("nothing to call")]
    NothingToCall,
    #[error("cannot bet once the round is opened")]
    CannotBetWhenOpened,
    #[error("cannot raise before the round is opened")]
    CannotRaiseUnopened,
    #[error("raising is closed for this seat until the action reopens")]
    RaiseNotReopened,
    #[error("target {target} is below the minimum of {min}")]
    BelowMinimum { target: Chips, min: Chips },
    #[error("target {target} exceeds the seat's chips")]
    InsufficientChips { target: Chips },
    #[error(transparent)]
    State(#[from] StateError),
}

/// Fail-fast self checks run after every engine mutation.
pub trait InvariantCheck {
    fn validate_invariants(&self) -> Result<(), StateError>;
}
