//! Deterministic combat planning shared by the runtime and offline tools.
//!
//! `combat-core` owns the board geometry and the planning pipeline of a single
//! turn: target acquisition, cast-position search, path search and tackle
//! simulation. Everything here is synchronous and side-effect free apart from
//! `tracing` diagnostics; the live fight is only reached through the
//! [`FightOracle`] and [`MapOracle`] collaborators.
pub mod config;
pub mod env;
pub mod error;
pub mod geometry;
pub mod planner;
pub mod state;

pub use config::PlannerConfig;
pub use env::{CastCheck, CombatEnv, FightOracle, MapLayout, MapOracle};
pub use error::{CombatError, ErrorSeverity, PlanError};
pub use geometry::{Zone, cell_line, has_line_of_sight};
pub use planner::{
    CastPositions, PathSearch, PlannedAction, TackleOutcome, Target, TargetFilter, TurnPlan,
    acquire_targets, analyze_tackle_path, find_cast_positions, find_path_to_target, plan_turn,
    tackle_factor,
};
pub use state::{
    CELL_COUNT, Cell, Fighter, FighterFlags, FighterId, MAP_HEIGHT, MAP_WIDTH, Point,
    SpellDescriptor, SpellId, TeamId, ZoneShape,
};
