//! Async execution of planned combat turns.
//!
//! This crate drives a fight session through the turn state machine: it asks
//! `combat-core` for a plan, submits moves and casts, waits for their results
//! on a typed event channel and applies the retry policy when the session
//! refuses an action. Consumers build a [`TurnEngine`] and call
//! [`TurnEngine::play_turn`] once per turn.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the engine and its builder
//! - [`api`] exposes the session interface and error types
//! - [`turn`] holds the state machine, retry policy and action queue
//! - [`events`] provides a topic-based event bus for observability
//! - [`session`] and [`scenario`] provide an in-memory fight for replays and tests
pub mod api;
pub mod config;
pub mod events;
pub mod runtime;
pub mod scenario;
pub mod session;
pub mod turn;

pub use api::{
    ActionResult, ActionSession, Result, ResultDetails, RuntimeError, SessionCommand,
    SessionEvent, SessionEventKind, TurnId, session_channel,
};
pub use config::{EngineConfig, FilterPreset, TurnConfig};
pub use events::{ActionEvent, Event, EventBus, Topic, TurnEvent};
pub use runtime::{TurnEngine, TurnEngineBuilder};
pub use scenario::{FighterSetup, Scenario};
pub use session::{CommandKind, CommandRecord, ScriptedFailure, SimulatedFight};
pub use turn::{FightTurn, TurnOutcome, TurnReport, TurnState};
