//! Unified error types surfaced by the runtime API.
//!
//! Execution failures reported by the session (blocked paths, refused casts)
//! are not errors: they feed the retry policy and end up in the turn outcome.
//! What remains here are broken invariants, missing wiring and I/O problems
//! that the caller has to deal with.
use thiserror::Error;

use combat_core::{CombatError, ErrorSeverity, PlanError, SpellId};

use super::session::TurnId;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("end-of-turn already sent for {turn}")]
    EndTurnAlreadySent { turn: TurnId },

    #[error("planning requested after end-of-turn was sent for {turn}")]
    PlanningAfterEndTurn { turn: TurnId },

    #[error("session failure: {0}")]
    Session(String),

    #[error("turn engine requires a {0} collaborator before building")]
    MissingCollaborator(&'static str),

    #[error("scenario error: {0}")]
    Scenario(String),

    #[error("{spell} level {level} is not known by the session")]
    InvalidSpell { spell: SpellId, level: u8 },

    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl CombatError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::EndTurnAlreadySent { .. } | Self::PlanningAfterEndTurn { .. } => {
                ErrorSeverity::Fatal
            }
            Self::Session(_) => ErrorSeverity::Recoverable,
            Self::MissingCollaborator(_) | Self::Scenario(_) | Self::InvalidSpell { .. } => {
                ErrorSeverity::Validation
            }
            Self::Plan(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EndTurnAlreadySent { .. } => "RUNTIME_END_TURN_ALREADY_SENT",
            Self::PlanningAfterEndTurn { .. } => "RUNTIME_PLANNING_AFTER_END_TURN",
            Self::Session(_) => "RUNTIME_SESSION",
            Self::MissingCollaborator(_) => "RUNTIME_MISSING_COLLABORATOR",
            Self::Scenario(_) => "RUNTIME_SCENARIO",
            Self::InvalidSpell { .. } => "RUNTIME_INVALID_SPELL",
            Self::Plan(err) => err.error_code(),
        }
    }
}
