//! Environment channel traits and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Reward, StateBits};

/// What the environment reports after each exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Raw state string
    pub state: StateBits,
    /// Reward for the last action
    pub reward: Reward,
}

impl Observation {
    /// Create a new observation
    pub fn new(state: impl Into<StateBits>, reward: impl Into<Reward>) -> Self {
        Self {
            state: state.into(),
            reward: reward.into(),
        }
    }
}

/// Stateful duplex channel to a running environment
///
/// One channel serves one session; every call waits for the environment's
/// reply before returning.
#[async_trait]
pub trait Channel: Send {
    /// Submit an action by name and wait for the resulting state and reward
    ///
    /// An empty action asks for the current state without advancing the
    /// environment.
    async fn exchange(&mut self, action: &str) -> crate::Result<Observation>;

    /// Ask for the current state without acting
    async fn initial(&mut self) -> crate::Result<Observation> {
        self.exchange("").await
    }

    /// Close the channel
    async fn close(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<C> Channel for Box<C>
where
    C: Channel + ?Sized,
{
    async fn exchange(&mut self, action: &str) -> crate::Result<Observation> {
        (**self).exchange(action).await
    }

    async fn initial(&mut self) -> crate::Result<Observation> {
        (**self).initial().await
    }

    async fn close(&mut self) -> crate::Result<()> {
        (**self).close().await
    }
}
