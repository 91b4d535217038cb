use crate::planner::tackle;
use crate::state::{Cell, Fighter, FighterId, SpellDescriptor, SpellId};

/// Answer of the session's casting capability check.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastCheck {
    pub allowed: bool,
    /// Why the cast is refused; empty when allowed.
    pub reason: String,
}

impl CastCheck {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Snapshot queries the planner issues against the live fight.
pub trait FightOracle: Send + Sync {
    /// The fighter whose turn is being played, if the session knows it.
    fn active_fighter(&self) -> Option<Fighter>;

    /// Every fighter known to the session, both teams, dead ones included.
    fn fighters(&self) -> Vec<Fighter>;

    fn spell(&self, spell: SpellId, level: u8) -> Option<SpellDescriptor>;

    /// Whether the active fighter may cast `spell` right now, optionally on a
    /// specific cell (cooldowns, AP, per-target limits, states).
    fn can_cast(&self, spell: &SpellDescriptor, target: Option<Cell>) -> CastCheck;

    /// True while a previous action is still being animated; actions submitted
    /// meanwhile are rejected by the session.
    fn is_sequence_executing(&self) -> bool {
        false
    }

    fn fighter(&self, id: FighterId) -> Option<Fighter> {
        self.fighters().into_iter().find(|f| f.id == id)
    }

    /// Fraction of its points `fighter` keeps when leaving `cell`, in `[0, 1]`.
    fn tackle_factor(&self, fighter: &Fighter, cell: Cell) -> f64 {
        tackle::tackle_factor(fighter, cell, &self.fighters())
    }
}
