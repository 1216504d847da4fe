//! Core tabular reinforcement learning types for Jumper RL
//!
//! This crate provides the building blocks of an online Q-learning agent:
//! decoding environment states into table rows, the Q-value table and its
//! temporal-difference update, epsilon-greedy action selection, and the
//! plain-text snapshot format the table is persisted in.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod environment;
pub mod error;
pub mod policy;
pub mod reward;
pub mod snapshot;
pub mod state;
pub mod trajectory;
pub mod value;

// Re-export core traits and types
pub use action::{ActionIndex, ActionSet};
pub use environment::{Channel, Observation};
pub use error::{RLError, Result};
pub use policy::{Decision, DecisionKind, EpsilonGreedy, Greedy, Policy};
pub use reward::Reward;
pub use snapshot::SnapshotError;
pub use state::{StateBits, StateCodec, StateDetails, StateIndex};
pub use trajectory::Transition;
pub use value::{TableShape, ValueTable};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ActionIndex, ActionSet, Channel, EpsilonGreedy, Observation, Policy, Reward, Result,
        StateBits, StateCodec, StateIndex, Transition, ValueTable,
    };
}
