//! Failure classification and the per-turn retry budget.
//!
//! Session result codes are decoded into [`MoveFailure`] / [`CastFailure`].
//! Each failure says whether trying again makes sense and whether it should
//! end the turn outright; [`RetryBudget`] combines that with the number of
//! retries already spent.

/// Common view over decoded failure codes.
pub trait Failure: std::fmt::Debug {
    fn code(&self) -> i32;
    fn can_retry(&self) -> bool;
    fn should_end_turn(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveFailure {
    NoFighterPosition,
    PathBlocked,
    InsufficientMovementPoints,
    MovementFailed,
    InvalidPath,
    MaxRetriesExceeded,
    Timeout,
    Unknown(i32),
}

impl MoveFailure {
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::NoFighterPosition,
            2 => Self::PathBlocked,
            3 => Self::InsufficientMovementPoints,
            4 => Self::MovementFailed,
            5 => Self::InvalidPath,
            6 => Self::MaxRetriesExceeded,
            7 => Self::Timeout,
            other => Self::Unknown(other),
        }
    }
}

impl Failure for MoveFailure {
    fn code(&self) -> i32 {
        match *self {
            Self::NoFighterPosition => 1,
            Self::PathBlocked => 2,
            Self::InsufficientMovementPoints => 3,
            Self::MovementFailed => 4,
            Self::InvalidPath => 5,
            Self::MaxRetriesExceeded => 6,
            Self::Timeout => 7,
            Self::Unknown(code) => code,
        }
    }

    fn can_retry(&self) -> bool {
        matches!(self, Self::PathBlocked | Self::MovementFailed | Self::Timeout)
    }

    fn should_end_turn(&self) -> bool {
        !self.can_retry()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastFailure {
    NoLineOfSight,
    UnexpectedCast,
    CastFailed,
    CannotCast,
    NoFighterPosition,
    Timeout,
    Unknown(i32),
}

impl CastFailure {
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::NoLineOfSight,
            2 => Self::UnexpectedCast,
            3 => Self::CastFailed,
            4 => Self::CannotCast,
            5 => Self::NoFighterPosition,
            6 => Self::Timeout,
            other => Self::Unknown(other),
        }
    }
}

impl Failure for CastFailure {
    fn code(&self) -> i32 {
        match *self {
            Self::NoLineOfSight => 1,
            Self::UnexpectedCast => 2,
            Self::CastFailed => 3,
            Self::CannotCast => 4,
            Self::NoFighterPosition => 5,
            Self::Timeout => 6,
            Self::Unknown(code) => code,
        }
    }

    fn can_retry(&self) -> bool {
        matches!(self, Self::NoLineOfSight | Self::CastFailed | Self::Timeout)
    }

    fn should_end_turn(&self) -> bool {
        !self.can_retry()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    EndTurn,
}

/// Retries spent in the current turn. Never decreases; a fresh budget is
/// created for every turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryBudget {
    max: u32,
    used: u32,
}

impl RetryBudget {
    pub const fn new(max: u32) -> Self {
        Self { max, used: 0 }
    }

    pub const fn used(&self) -> u32 {
        self.used
    }

    pub const fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }

    /// Decides what to do with a failure, consuming one retry when allowed.
    pub fn decide(&mut self, failure: &dyn Failure) -> RetryDecision {
        if failure.can_retry() && !failure.should_end_turn() && self.used < self.max {
            self.used += 1;
            RetryDecision::Retry
        } else {
            RetryDecision::EndTurn
        }
    }
}
