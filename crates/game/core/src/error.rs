//! Common error infrastructure for combat-core.
//!
//! Shared severity classification plus the planner's own error type. Runtime
//! errors in `combat-runtime` implement [`CombatError`] too, so callers can
//! decide between retrying, replanning, and aborting from one place.

use crate::state::{FighterId, SpellId};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the world changed under us; replanning may succeed
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistencies that require investigation
/// - **Fatal**: a state-machine invariant was broken, abort loudly
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSeverity {
    /// Examples: path blocked, target moved out of sight.
    Recoverable,

    /// Examples: spell with a negative AP cost.
    Validation,

    /// Examples: collaborator returned an inconsistent snapshot.
    Internal,

    /// Examples: end-of-turn sent twice, planning after the turn ended.
    Fatal,
}

impl ErrorSeverity {
    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all combat errors.
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Errors raised while turning snapshots into a plan.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("fighter {fighter} is not standing on the board")]
    FighterOffBoard { fighter: FighterId },

    #[error("{spell} has negative AP cost {ap_cost}")]
    InvalidSpellCost { spell: SpellId, ap_cost: i32 },
}

impl CombatError for PlanError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::FighterOffBoard { .. } => ErrorSeverity::Internal,
            Self::InvalidSpellCost { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::FighterOffBoard { .. } => "PLAN_FIGHTER_OFF_BOARD",
            Self::InvalidSpellCost { .. } => "PLAN_INVALID_SPELL_COST",
        }
    }
}
