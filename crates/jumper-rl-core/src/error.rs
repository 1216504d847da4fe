//! Error types for the RL core library

use thiserror::Error;

use crate::snapshot::SnapshotError;

/// Core error type for RL operations
#[derive(Error, Debug)]
pub enum RLError {
    /// The environment channel could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// The environment channel failed after it was established
    #[error("Environment error: {0}")]
    Environment(String),

    /// Agent-related errors
    #[error("Agent error: {0}")]
    Agent(String),

    /// State string that cannot be decoded
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Row or column index outside the value table
    #[error("{axis} index {index} out of bounds for table with {len} {axis}s")]
    IndexOutOfBounds {
        /// Which table axis was indexed ("state" or "action")
        axis: &'static str,
        /// Offending index
        index: usize,
        /// Length of that axis
        len: usize,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot read or write failure
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RLError {
    pub(crate) fn state_out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            axis: "state",
            index,
            len,
        }
    }

    pub(crate) fn action_out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            axis: "action",
            index,
            len,
        }
    }
}

/// Result type alias for RL operations
pub type Result<T> = std::result::Result<T, RLError>;
