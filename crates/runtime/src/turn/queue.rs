use std::collections::VecDeque;

use combat_core::PlannedAction;

/// FIFO of planned actions for the current decision cycle.
#[derive(Clone, Debug, Default)]
pub struct ActionQueue {
    actions: VecDeque<PlannedAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, actions: impl IntoIterator<Item = PlannedAction>) {
        self.actions.extend(actions);
    }

    pub fn pop(&mut self) -> Option<PlannedAction> {
        self.actions.pop_front()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}
