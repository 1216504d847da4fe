//! Online Q-learning agent for Jumper RL
//!
//! This crate ties the core pieces together:
//! - [`TrainerConfig`]: hyperparameters, action vocabulary and snapshot path
//! - [`Trainer`]: the observe / act / update / persist loop
//! - [`stop_signal`]: cooperative stop between steps

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod trainer;

pub use config::{ChannelConfig, TrainerConfig};
pub use trainer::{stop_signal, Phase, SessionStats, StepReport, StopHandle, StopSignal, Trainer};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{stop_signal, Phase, StopSignal, Trainer, TrainerConfig};
    pub use jumper_rl_core::prelude::*;
}
