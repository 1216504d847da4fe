//! Policy abstractions for action selection

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::{ActionIndex, ActionSet, StateIndex, ValueTable};

/// How an action was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionKind {
    /// Sampled uniformly at random (exploration)
    Random,
    /// Highest-valued action of the table (exploitation)
    Greedy,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Random => "random",
            Self::Greedy => "greedy",
        })
    }
}

/// Action picked by a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decision {
    /// Chosen action
    pub action: ActionIndex,
    /// Whether it was explored or exploited
    pub kind: DecisionKind,
}

/// Core policy trait for selecting actions
pub trait Policy: Send + Sync {
    /// Action vocabulary the policy chooses from
    fn actions(&self) -> &ActionSet;

    /// Select an action for `state`
    fn select(
        &self,
        state: StateIndex,
        table: &ValueTable,
        rng: &mut dyn RngCore,
    ) -> crate::Result<Decision>;

    /// Select an action and resolve its name
    fn select_named(
        &self,
        state: StateIndex,
        table: &ValueTable,
        rng: &mut dyn RngCore,
    ) -> crate::Result<(Decision, &str)> {
        let decision = self.select(state, table, rng)?;
        let name = self.actions().name(decision.action)?;
        Ok((decision, name))
    }
}

/// Always exploit the table
#[derive(Debug, Clone)]
pub struct Greedy {
    /// Action vocabulary
    pub actions: ActionSet,
}

impl Greedy {
    /// Create a new greedy policy
    #[must_use]
    pub fn new(actions: ActionSet) -> Self {
        Self { actions }
    }
}

impl Policy for Greedy {
    fn actions(&self) -> &ActionSet {
        &self.actions
    }

    fn select(
        &self,
        state: StateIndex,
        table: &ValueTable,
        _rng: &mut dyn RngCore,
    ) -> crate::Result<Decision> {
        Ok(Decision {
            action: table.best_action(state)?,
            kind: DecisionKind::Greedy,
        })
    }
}

/// Epsilon-greedy policy with a fixed exploration rate
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    /// Exploration rate
    pub epsilon: f64,
    /// Action vocabulary
    pub actions: ActionSet,
}

impl EpsilonGreedy {
    /// Create a new epsilon-greedy policy
    #[must_use]
    pub fn new(epsilon: f64, actions: ActionSet) -> Self {
        Self { epsilon, actions }
    }
}

impl Policy for EpsilonGreedy {
    fn actions(&self) -> &ActionSet {
        &self.actions
    }

    fn select(
        &self,
        state: StateIndex,
        table: &ValueTable,
        rng: &mut dyn RngCore,
    ) -> crate::Result<Decision> {
        let decision = if rng.gen::<f64>() < self.epsilon {
            // Explore: the table is not consulted
            Decision {
                action: self.actions.sample(rng),
                kind: DecisionKind::Random,
            }
        } else {
            Decision {
                action: table.best_action(state)?,
                kind: DecisionKind::Greedy,
            }
        };

        debug!(
            %state,
            action = self.actions.name(decision.action).unwrap_or("?"),
            kind = %decision.kind,
            "action selected"
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table() -> ValueTable {
        ValueTable::from_array(array![[0.0, 0.0, 0.0], [0.5, -1.0, 2.0], [3.0, 3.0, 1.0]])
    }

    #[test]
    fn test_zero_epsilon_is_greedy() {
        let policy = EpsilonGreedy::new(0.0, ActionSet::default());
        let table = table();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            for state in 0..3 {
                let state = StateIndex(state);
                let decision = policy.select(state, &table, &mut rng).unwrap();
                assert_eq!(decision.kind, DecisionKind::Greedy);
                assert_eq!(decision.action, table.best_action(state).unwrap());
            }
        }

        let (_, name) = policy.select_named(StateIndex(1), &table, &mut rng).unwrap();
        assert_eq!(name, "jump");
    }

    #[test]
    fn test_full_epsilon_is_uniform() {
        let policy = EpsilonGreedy::new(1.0, ActionSet::default());
        // Only one row: any lookup of state 50 would fail
        let table = ValueTable::zeros((1, 3));
        let mut rng = StdRng::seed_from_u64(42);

        let trials = 30_000;
        let mut counts = [0usize; 3];
        for _ in 0..trials {
            let decision = policy.select(StateIndex(50), &table, &mut rng).unwrap();
            assert_eq!(decision.kind, DecisionKind::Random);
            counts[decision.action.0] += 1;
        }

        for count in counts {
            let share = count as f64 / f64::from(trials);
            assert!((share - 1.0 / 3.0).abs() < 0.02, "share {share} not uniform");
        }
    }

    #[test]
    fn test_greedy_policy_propagates_index_errors() {
        let policy = Greedy::new(ActionSet::default());
        let mut rng = StdRng::seed_from_u64(0);
        assert!(policy.select(StateIndex(3), &table(), &mut rng).is_err());
        assert_eq!(
            policy.select(StateIndex(2), &table(), &mut rng).unwrap().action,
            ActionIndex(0)
        );
    }
}
