//! Online Q-learning loop
//!
//! A [`Trainer`] owns the value table for the lifetime of a session and walks
//! through three phases:
//!
//! ```text
//! Disconnected --attach--> AwaitingInitialState --start--> Stepping --step--> Stepping ...
//! ```
//!
//! Each step selects an action, exchanges it with the environment, applies
//! the update rule to the resulting transition and saves the table. There is
//! no terminal state: [`Trainer::run`] keeps stepping until its
//! [`StopSignal`] is raised or the configured step limit is hit.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use jumper_rl_core::{
    Channel, DecisionKind, EpsilonGreedy, Observation, Policy, RLError, Result, Reward,
    StateBits, StateDetails, StateIndex, Transition, ValueTable,
};

use crate::config::TrainerConfig;

/// Where the trainer is in its session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No environment channel attached
    Disconnected,
    /// Channel attached, initial state not yet requested
    AwaitingInitialState,
    /// Learning; `current` is the state the next action is taken in
    Stepping {
        /// Current state
        current: StateIndex,
    },
}

/// Outcome of one learning step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// 1-based step number within the session
    pub step: u64,
    /// Name of the action taken
    pub action: String,
    /// Whether the action was explored or exploited
    pub kind: DecisionKind,
    /// State the action was taken in
    pub state: StateIndex,
    /// State the environment moved to
    pub next_state: StateIndex,
    /// Raw next state string
    pub next_state_bits: StateBits,
    /// Decoded fields of the next state
    pub details: StateDetails,
    /// Reward received
    pub reward: Reward,
    /// Updated value of the (state, action) cell
    pub q_value: f64,
    /// Whether the snapshot write succeeded
    pub saved: bool,
}

/// Running statistics of a training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session ID
    pub id: Uuid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub finished_at: Option<DateTime<Utc>>,
    /// Learning steps taken
    pub steps: u64,
    /// Sum of rewards over all steps (initial reward excluded)
    pub total_reward: f64,
    /// Steps where the action was explored
    pub random_actions: u64,
    /// Steps where the action was exploited
    pub greedy_actions: u64,
    /// Reward that came with the initial state; never used for learning
    pub initial_reward: Option<Reward>,
    /// Snapshot writes that failed
    pub failed_saves: u64,
}

impl SessionStats {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            steps: 0,
            total_reward: 0.0,
            random_actions: 0,
            greedy_actions: 0,
            initial_reward: None,
            failed_saves: 0,
        }
    }
}

/// Raises the stop flag of a running trainer
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Ask the trainer to stop after the current step
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Stop flag checked by [`Trainer::run`] between steps
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

/// Create a connected stop handle and signal
#[must_use]
pub fn stop_signal() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

impl StopSignal {
    /// A signal that is never raised
    #[must_use]
    pub fn never() -> Self {
        stop_signal().1
    }

    /// Whether a stop was requested
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Q-learning trainer driving one environment session
pub struct Trainer<C, P = EpsilonGreedy> {
    config: TrainerConfig,
    policy: P,
    table: ValueTable,
    channel: Option<C>,
    phase: Phase,
    rng: StdRng,
    stats: SessionStats,
}

impl<C: Channel> Trainer<C, EpsilonGreedy> {
    /// Create a trainer using the configured epsilon-greedy policy
    pub fn new(config: TrainerConfig, table: ValueTable) -> Result<Self> {
        let policy = config.policy();
        Self::with_policy(config, table, policy)
    }
}

impl<C: Channel, P: Policy> Trainer<C, P> {
    /// Create a trainer with a custom policy
    pub fn with_policy(config: TrainerConfig, table: ValueTable, policy: P) -> Result<Self> {
        config.validate()?;
        if table.shape() != config.shape() {
            return Err(RLError::Config(format!(
                "table shape {} does not match configured shape {}",
                table.shape(),
                config.shape()
            )));
        }
        if policy.actions().len() != config.actions.len() {
            return Err(RLError::Config(format!(
                "policy has {} actions, table has {}",
                policy.actions().len(),
                config.actions.len()
            )));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            policy,
            table,
            channel: None,
            phase: Phase::Disconnected,
            rng,
            stats: SessionStats::new(),
        })
    }

    /// Attach a connected environment channel
    pub fn attach(&mut self, channel: C) -> Result<()> {
        if self.phase != Phase::Disconnected {
            return Err(RLError::Agent(format!(
                "cannot attach a channel while {:?}",
                self.phase
            )));
        }
        self.channel = Some(channel);
        self.phase = Phase::AwaitingInitialState;
        Ok(())
    }

    /// Request the initial state and start stepping from it
    ///
    /// The reward that comes with the initial state is recorded in the
    /// session statistics but never used to update the table.
    pub async fn start(&mut self) -> Result<Observation> {
        if self.phase != Phase::AwaitingInitialState {
            return Err(RLError::Agent(format!(
                "cannot request the initial state while {:?}",
                self.phase
            )));
        }
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| RLError::Agent("no channel attached".to_string()))?;

        let observation = channel.initial().await?;
        let (index, details) = self.config.codec.interpret(&observation.state)?;
        info!(
            state = %observation.state,
            platform = details.platform,
            direction = details.direction,
            reward = %observation.reward,
            "initial state"
        );

        self.stats.initial_reward = Some(observation.reward);
        self.phase = Phase::Stepping { current: index };
        Ok(observation)
    }

    /// Run one select / exchange / update / save cycle
    pub async fn step(&mut self) -> Result<StepReport> {
        let Phase::Stepping { current } = self.phase else {
            return Err(RLError::Agent(format!("cannot step while {:?}", self.phase)));
        };
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| RLError::Agent("no channel attached".to_string()))?;

        let (decision, name) = self
            .policy
            .select_named(current, &self.table, &mut self.rng)?;
        let action = name.to_owned();

        let observation = channel.exchange(&action).await?;
        let (next_state, details) = self.config.codec.interpret(&observation.state)?;

        let transition = Transition::new(current, decision.action, observation.reward, next_state);
        let q_value = self.table.update(
            &transition,
            self.config.learning_rate,
            self.config.discount_factor,
        )?;

        let saved = match self.table.save(&self.config.snapshot_path).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    path = %self.config.snapshot_path.display(),
                    error = %e,
                    "failed to save Q-table"
                );
                self.stats.failed_saves += 1;
                false
            }
        };

        self.phase = Phase::Stepping {
            current: next_state,
        };
        self.stats.steps += 1;
        self.stats.total_reward += observation.reward.value();
        match decision.kind {
            DecisionKind::Random => self.stats.random_actions += 1,
            DecisionKind::Greedy => self.stats.greedy_actions += 1,
        }

        debug!(
            step = self.stats.steps,
            action = %action,
            kind = %decision.kind,
            next_state = %observation.state,
            platform = details.platform,
            direction = details.direction,
            reward = %observation.reward,
            q_value,
            "step"
        );

        Ok(StepReport {
            step: self.stats.steps,
            action,
            kind: decision.kind,
            state: current,
            next_state,
            next_state_bits: observation.state,
            details,
            reward: observation.reward,
            q_value,
            saved,
        })
    }

    /// Keep stepping until `stop` is raised or `max_steps` is reached
    ///
    /// Requests the initial state first if needed. The stop flag is checked
    /// between steps; a step in flight is always finished. Errors from the
    /// channel, the codec or the table end the run after the channel is
    /// closed.
    pub async fn run(&mut self, stop: &StopSignal) -> Result<SessionStats> {
        if self.phase == Phase::AwaitingInitialState {
            self.start().await?;
        }
        info!(
            session = %self.stats.id,
            snapshot = %self.config.snapshot_path.display(),
            max_steps = ?self.config.max_steps,
            "training started"
        );

        loop {
            if stop.is_stopped() {
                info!("stop requested");
                break;
            }
            if self
                .config
                .max_steps
                .is_some_and(|max| self.stats.steps >= max)
            {
                info!(steps = self.stats.steps, "step limit reached");
                break;
            }
            if let Err(e) = self.step().await {
                if let Err(close_error) = self.close().await {
                    warn!(error = %close_error, "failed to close channel after error");
                }
                return Err(e);
            }
        }

        self.close().await?;
        info!(
            session = %self.stats.id,
            steps = self.stats.steps,
            total_reward = self.stats.total_reward,
            "training finished"
        );
        Ok(self.stats.clone())
    }

    /// Close the channel and return to [`Phase::Disconnected`]
    pub async fn close(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.as_mut() {
            channel.close().await?;
        }
        self.phase = Phase::Disconnected;
        self.stats.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current value table
    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    /// Give up the trainer, keeping the learned table
    pub fn into_table(self) -> ValueTable {
        self.table
    }

    /// Session statistics so far
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Attached channel, if any
    pub fn channel(&self) -> Option<&C> {
        self.channel.as_ref()
    }

    /// Active configuration
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }
}
