//! Snapshot types read by the planner.
//!
//! Everything here is a plain value: fighters and spells are owned by the
//! session and copied in at the start of each decision cycle.
mod cell;
mod fighter;
mod spell;

pub use cell::{CELL_COUNT, Cell, MAP_HEIGHT, MAP_WIDTH, Point};
pub use fighter::{Fighter, FighterFlags, FighterId, TeamId};
pub use spell::{SpellDescriptor, SpellId, ZoneShape};
