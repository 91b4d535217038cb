use serde::{Deserialize, Serialize};

use crate::api::TurnId;

/// How a turn ended.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TurnOutcome {
    Success,
    Disconnected,
    NoTargets,
    CannotCast,
    NoPath,
    PlayerDead,
    NoFighterInfo,
    InvalidState,
}

impl TurnOutcome {
    /// Stable numeric code reported to callers.
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Disconnected => 1,
            Self::NoTargets => 2,
            Self::CannotCast => 3,
            Self::NoPath => 4,
            Self::PlayerDead => 5,
            Self::NoFighterInfo => 6,
            Self::InvalidState => 8,
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Summary of one played turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: TurnId,
    pub outcome: TurnOutcome,
    pub message: Option<String>,
    /// Moves and casts the session accepted.
    pub actions_executed: u32,
    pub retries_used: u32,
    pub end_turn_sent: bool,
}
