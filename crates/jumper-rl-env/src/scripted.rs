//! In-memory environment that replays scripted observations

use async_trait::async_trait;
use std::collections::VecDeque;

use jumper_rl_core::{Channel, Observation, RLError, Result};

/// Channel that answers from a script instead of a live game
///
/// Every action received is recorded, so callers can check what an agent
/// sent. Used for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChannel {
    script: VecDeque<Observation>,
    /// Reply given once the script runs out
    fallback: Option<Observation>,
    actions: Vec<String>,
    closed: bool,
}

impl ScriptedChannel {
    /// Reply with each observation once, in order, then fail
    pub fn new(script: impl IntoIterator<Item = Observation>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Reply with the same observation forever, whatever the action
    #[must_use]
    pub fn fixed(observation: Observation) -> Self {
        Self {
            fallback: Some(observation),
            ..Self::default()
        }
    }

    /// Actions received so far, including the empty initial request
    #[must_use]
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Whether [`Channel::close`] was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    async fn exchange(&mut self, action: &str) -> Result<Observation> {
        if self.closed {
            return Err(RLError::Environment("channel is closed".to_owned()));
        }
        self.actions.push(action.to_owned());

        self.script
            .pop_front()
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| RLError::Environment("script exhausted".to_owned()))
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_exhausted() {
        let mut channel = ScriptedChannel::new([
            Observation::new("0b0000000", 0.0),
            Observation::new("0b0000101", -1.0),
        ]);

        assert_eq!(channel.initial().await.unwrap().state.as_str(), "0b0000000");
        assert_eq!(channel.exchange("jump").await.unwrap().state.as_str(), "0b0000101");
        assert!(matches!(
            channel.exchange("left").await,
            Err(RLError::Environment(_))
        ));
        assert_eq!(channel.actions(), ["", "jump", "left"]);
    }

    #[tokio::test]
    async fn test_fixed_repeats_forever() {
        let observation = Observation::new("000000001", 1.0);
        let mut channel = ScriptedChannel::fixed(observation.clone());
        for action in ["left", "right", "jump", "left"] {
            assert_eq!(channel.exchange(action).await.unwrap(), observation);
        }
        channel.close().await.unwrap();
        assert!(channel.is_closed());
        assert!(channel.exchange("left").await.is_err());
    }
}
