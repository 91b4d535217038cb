//! Event types for different topics.

use serde::{Deserialize, Serialize};

use combat_core::{FighterId, PlannedAction};

use crate::api::TurnId;
use crate::turn::{TurnReport, TurnState};

/// Turn lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TurnEvent {
    Started {
        turn: TurnId,
        fighter: Option<FighterId>,
    },
    StateChanged {
        turn: TurnId,
        from: TurnState,
        to: TurnState,
    },
    Finished(TurnReport),
}

/// Actions sent to the session and their answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionEvent {
    Planned {
        turn: TurnId,
        actions: Vec<PlannedAction>,
    },
    Submitted {
        turn: TurnId,
        action: PlannedAction,
    },
    Resolved {
        turn: TurnId,
        action: PlannedAction,
        code: i32,
        message: String,
    },
    RetryScheduled {
        turn: TurnId,
        code: i32,
        retries_used: u32,
    },
}
