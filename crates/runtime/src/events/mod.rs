//! Topic-based event bus for turn observability.
//!
//! The turn state machine publishes lifecycle and action events here; tools
//! such as the replay binary subscribe to the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{ActionEvent, TurnEvent};
