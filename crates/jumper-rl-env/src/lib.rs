//! Environment channels for Jumper RL
//!
//! This crate provides the two ways an agent talks to its environment:
//! - a TCP client for the platform-jumping game server
//! - a scripted in-memory channel for tests and dry runs

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod scripted;
pub mod tcp;
pub mod wire;

// Re-export channels
pub use scripted::ScriptedChannel;
pub use tcp::{StreamChannel, TcpChannel};

// Re-export core types
pub use jumper_rl_core::{Channel, Observation, Reward, StateBits};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{ScriptedChannel, TcpChannel};
    pub use jumper_rl_core::prelude::*;
}
