//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! the turn machinery can stay focused on orchestration.

pub mod errors;
pub mod session;

pub use errors::{Result, RuntimeError};
pub use session::{
    ActionResult, ActionSession, ResultDetails, SessionCommand, SessionEvent, SessionEventKind,
    TurnId, session_channel,
};
