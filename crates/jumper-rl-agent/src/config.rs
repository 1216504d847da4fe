//! Trainer configuration
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! gives the stock setup: a 24-platform, 4-direction game on
//! `127.0.0.1:2037` with the actions `left`, `right` and `jump`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use jumper_rl_core::{ActionSet, EpsilonGreedy, RLError, Result, StateCodec, TableShape};

/// Where the environment listens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelConfig {
    /// Host name or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 2037,
        }
    }
}

impl ChannelConfig {
    /// `host:port` string suitable for connecting
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for a training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainerConfig {
    /// Learning rate (alpha)
    pub learning_rate: f64,
    /// Discount factor (gamma)
    pub discount_factor: f64,
    /// Exploration rate (epsilon), fixed for the whole session
    pub exploration_rate: f64,
    /// Ordered action vocabulary; position is the table column
    pub actions: ActionSet,
    /// File the table is loaded from and saved to after every step
    pub snapshot_path: PathBuf,
    /// Number of platforms in the game
    pub platforms: usize,
    /// Number of directions per platform
    pub directions: usize,
    /// Seed for the exploration RNG; entropy-seeded when absent
    pub seed: Option<u64>,
    /// Stop after this many steps; run until stopped when absent
    pub max_steps: Option<u64>,
    /// Environment address
    pub channel: ChannelConfig,
    /// Layout of the state bit string
    pub codec: StateCodec,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.7,
            discount_factor: 0.95,
            exploration_rate: 0.1,
            actions: ActionSet::default(),
            snapshot_path: PathBuf::from("result.txt"),
            platforms: 24,
            directions: 4,
            seed: None,
            max_steps: None,
            channel: ChannelConfig::default(),
            codec: StateCodec::default(),
        }
    }
}

impl TrainerConfig {
    /// Read and validate a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RLError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML configuration
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| RLError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the hyperparameters and table dimensions
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("learning_rate", self.learning_rate),
            ("discount_factor", self.discount_factor),
            ("exploration_rate", self.exploration_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RLError::Config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.actions.is_empty() {
            return Err(RLError::Config("at least one action is required".to_string()));
        }
        if self.actions.has_duplicates() {
            return Err(RLError::Config("action names must be unique".to_string()));
        }
        if self.platforms == 0 || self.directions == 0 {
            return Err(RLError::Config(
                "platforms and directions must be non-zero".to_string(),
            ));
        }
        if self.codec.platform_width == 0 || self.codec.direction_width == 0 {
            return Err(RLError::Config(
                "codec platform_width and direction_width must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of table rows
    #[must_use]
    pub fn num_states(&self) -> usize {
        self.platforms * self.directions
    }

    /// Shape of the value table
    #[must_use]
    pub fn shape(&self) -> TableShape {
        TableShape::new(self.num_states(), self.actions.len())
    }

    /// Exploration policy described by this configuration
    #[must_use]
    pub fn policy(&self) -> EpsilonGreedy {
        EpsilonGreedy::new(self.exploration_rate, self.actions.clone())
    }
}
