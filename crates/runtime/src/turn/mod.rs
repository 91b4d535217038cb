//! Turn execution: state machine, retry policy and action queue.
mod machine;
mod outcome;
pub mod policy;
mod queue;

pub use machine::{FightTurn, TurnContext, TurnState};
pub use outcome::{TurnOutcome, TurnReport};
pub use policy::{CastFailure, Failure, MoveFailure, RetryBudget, RetryDecision};
pub use queue::ActionQueue;
