//! Session implementations shipped with the runtime.
mod simulated;

pub use simulated::{CommandKind, CommandRecord, ScriptedFailure, SimulatedFight};
