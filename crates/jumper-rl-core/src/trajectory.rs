//! Transitions fed to the update rule

use serde::{Deserialize, Serialize};

use crate::{ActionIndex, Reward, StateIndex};

/// Single step of experience
///
/// Consumed by [`ValueTable::update`](crate::ValueTable::update) as soon as
/// it is observed; nothing keeps transitions around afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State the action was taken in
    pub state: StateIndex,
    /// Action taken
    pub action: ActionIndex,
    /// Reward received
    pub reward: Reward,
    /// State the environment moved to
    pub next_state: StateIndex,
}

impl Transition {
    /// Create a new transition
    #[must_use]
    pub fn new(
        state: StateIndex,
        action: ActionIndex,
        reward: Reward,
        next_state: StateIndex,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
        }
    }
}
