//! Command channel toward the live fight session.
//!
//! Commands go out through [`ActionSession::submit`]; their results come back
//! asynchronously as [`SessionEvent`]s on an `mpsc` channel owned by the turn
//! engine. Every event carries the [`TurnId`] it belongs to so late answers
//! from a previous turn can be told apart.
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use combat_core::{Cell, SpellId};

use super::errors::Result;

/// Monotonic identifier of a turn played by the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub u64);

impl TurnId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn {}", self.0)
    }
}

/// Command submitted to the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    /// Walk the path; the first cell is the fighter's current cell.
    Move { path: Vec<Cell> },
    Cast { spell: SpellId, level: u8, target: Cell },
    EndTurn,
}

impl SessionCommand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Cast { .. } => "cast",
            Self::EndTurn => "end_turn",
        }
    }
}

/// Extra information attached to a failed move.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDetails {
    /// Cell that prevented the move, if the session knows it.
    pub blocked_cell: Option<Cell>,
    /// Cell where the fighter actually stopped.
    pub stopped_at: Option<Cell>,
}

/// Answer to a move or cast. Code `0` means success; other codes are
/// interpreted by the retry policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub code: i32,
    pub message: String,
    pub details: Option<ResultDetails>,
}

impl ActionResult {
    pub const SUCCESS: i32 = 0;

    pub fn success() -> Self {
        Self::default()
    }

    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: ResultDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }

    pub fn blocked_cell(&self) -> Option<Cell> {
        self.details.as_ref().and_then(|d| d.blocked_cell)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEventKind {
    MoveResolved(ActionResult),
    CastResolved(ActionResult),
    /// The previous action finished animating; new actions are accepted again.
    SequenceFinished,
    FighterDied,
    Disconnected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub turn: TurnId,
    pub kind: SessionEventKind,
}

impl SessionEvent {
    pub fn new(turn: TurnId, kind: SessionEventKind) -> Self {
        Self { turn, kind }
    }
}

/// Creates the channel sessions publish their events on.
pub fn session_channel(capacity: usize) -> (mpsc::Sender<SessionEvent>, mpsc::Receiver<SessionEvent>) {
    mpsc::channel(capacity.max(1))
}

/// Outbound side of the fight session.
///
/// Implementations must answer every `Move` and `Cast` with exactly one
/// matching `MoveResolved` / `CastResolved` event tagged with the same turn.
/// `EndTurn` expects no answer.
#[async_trait]
pub trait ActionSession: Send + Sync {
    /// Called once before a turn starts so the session can tag unsolicited
    /// events (deaths, disconnection) with the right turn.
    async fn begin_turn(&self, _turn: TurnId) -> Result<()> {
        Ok(())
    }

    async fn submit(&self, turn: TurnId, command: SessionCommand) -> Result<()>;

    fn is_connected(&self) -> bool;
}
