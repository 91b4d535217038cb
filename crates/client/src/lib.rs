//! Scenario replay client.
//!
//! Loads a RON scenario, wires it to the simulated fight session and plays
//! turns through [`combat_runtime::TurnEngine`] until one team is left.
pub mod config;
pub mod replay;

pub use config::ClientConfig;
pub use replay::{ReplaySummary, replay, run};
