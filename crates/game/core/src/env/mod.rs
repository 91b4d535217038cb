//! Collaborator interfaces consumed by the planner.
//!
//! The session owns the fight; the planner only reads it through
//! [`FightOracle`] (fighters, spells, casting rules) and [`MapOracle`] (board
//! geometry). [`CombatEnv`] bundles both so planning functions take one handle.
mod fight;
mod map;

pub use fight::{CastCheck, FightOracle};
pub use map::{MapLayout, MapOracle};

/// Read-only view over the collaborators needed for one decision cycle.
#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    map: &'a dyn MapOracle,
    fight: &'a dyn FightOracle,
}

impl<'a> CombatEnv<'a> {
    pub fn new(map: &'a dyn MapOracle, fight: &'a dyn FightOracle) -> Self {
        Self { map, fight }
    }

    pub fn map(&self) -> &'a dyn MapOracle {
        self.map
    }

    pub fn fight(&self) -> &'a dyn FightOracle {
        self.fight
    }
}

impl core::fmt::Debug for CombatEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CombatEnv").finish_non_exhaustive()
    }
}
