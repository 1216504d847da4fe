//! Tabular action-value function Q(s, a)

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ActionIndex, RLError, Result, StateIndex, Transition};

/// Dimensions of a value table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableShape {
    /// Number of rows (states)
    pub states: usize,
    /// Number of columns (actions)
    pub actions: usize,
}

impl TableShape {
    /// Create a new shape
    #[must_use]
    pub fn new(states: usize, actions: usize) -> Self {
        Self { states, actions }
    }
}

impl From<(usize, usize)> for TableShape {
    fn from((states, actions): (usize, usize)) -> Self {
        Self { states, actions }
    }
}

impl fmt::Display for TableShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.states, self.actions)
    }
}

/// Dense state-by-action table of estimated returns
///
/// The shape is fixed when the table is created. Cell contents only change
/// through [`ValueTable::update`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    values: Array2<f64>,
}

impl ValueTable {
    /// Create a table of the given shape filled with zeros
    #[must_use]
    pub fn zeros(shape: impl Into<TableShape>) -> Self {
        let shape = shape.into();
        Self {
            values: Array2::zeros((shape.states, shape.actions)),
        }
    }

    /// Wrap an existing matrix (rows are states, columns are actions)
    #[must_use]
    pub fn from_array(values: Array2<f64>) -> Self {
        Self { values }
    }

    /// Shape of the table
    #[must_use]
    pub fn shape(&self) -> TableShape {
        let (states, actions) = self.values.dim();
        TableShape { states, actions }
    }

    /// Borrow the underlying matrix
    #[must_use]
    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }

    /// Value of a single cell
    pub fn get(&self, state: StateIndex, action: ActionIndex) -> Result<f64> {
        self.check_state(state)?;
        self.check_action(action)?;
        Ok(self.values[[state.0, action.0]])
    }

    /// All action values of a state
    pub fn row(&self, state: StateIndex) -> Result<ArrayView1<'_, f64>> {
        self.check_state(state)?;
        Ok(self.values.row(state.0))
    }

    /// Action with the highest value in `state`
    ///
    /// Ties go to the lowest index, so a row of equal values yields action 0.
    pub fn best_action(&self, state: StateIndex) -> Result<ActionIndex> {
        let row = self.row(state)?;
        let mut best = 0;
        let mut best_value = f64::NEG_INFINITY;
        for (index, &value) in row.iter().enumerate() {
            if value > best_value {
                best = index;
                best_value = value;
            }
        }
        Ok(ActionIndex(best))
    }

    /// Highest action value in `state`
    pub fn max_value(&self, state: StateIndex) -> Result<f64> {
        Ok(self
            .row(state)?
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max))
    }

    /// Apply the Q-learning update for one transition
    ///
    /// `Q[s,a] <- (1 - lr) * Q[s,a] + lr * (r + discount * max_a' Q[s',a'])`
    ///
    /// The bootstrap term is read before the cell is written. Returns the new
    /// value of `Q[s,a]`; on an out-of-bounds index the table is left as is.
    pub fn update(
        &mut self,
        transition: &Transition,
        learning_rate: f64,
        discount_factor: f64,
    ) -> Result<f64> {
        self.check_state(transition.state)?;
        self.check_action(transition.action)?;
        let max_future_q = self.max_value(transition.next_state)?;

        let cell = &mut self.values[[transition.state.0, transition.action.0]];
        let new_q = (1.0 - learning_rate) * *cell
            + learning_rate * (transition.reward.0 + discount_factor * max_future_q);
        *cell = new_q;

        tracing::trace!(
            state = %transition.state,
            action = %transition.action,
            value = new_q,
            "updated q-value"
        );
        Ok(new_q)
    }

    fn check_state(&self, state: StateIndex) -> Result<()> {
        let states = self.values.nrows();
        if state.0 < states {
            Ok(())
        } else {
            Err(RLError::state_out_of_bounds(state.0, states))
        }
    }

    fn check_action(&self, action: ActionIndex) -> Result<()> {
        let actions = self.values.ncols();
        if action.0 < actions {
            Ok(())
        } else {
            Err(RLError::action_out_of_bounds(action.0, actions))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reward;
    use ndarray::array;
    use proptest::prelude::*;

    fn transition(s: usize, a: usize, r: f64, next: usize) -> Transition {
        Transition::new(StateIndex(s), ActionIndex(a), Reward(r), StateIndex(next))
    }

    #[test]
    fn test_zeros_shape() {
        let table = ValueTable::zeros((96, 3));
        assert_eq!(table.shape(), TableShape::new(96, 3));
        assert!(table.as_array().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_best_action_ties_pick_first() {
        let table = ValueTable::from_array(array![[0.0, 0.0, 0.0], [1.0, 3.0, 3.0], [-2.0, -1.0, -5.0]]);
        assert_eq!(table.best_action(StateIndex(0)).unwrap(), ActionIndex(0));
        assert_eq!(table.best_action(StateIndex(1)).unwrap(), ActionIndex(1));
        assert_eq!(table.best_action(StateIndex(2)).unwrap(), ActionIndex(1));
    }

    #[test]
    fn test_update_rule() {
        let mut table = ValueTable::from_array(array![[1.0, 2.0, 0.0], [4.0, -1.0, 3.0]]);
        let new_q = table.update(&transition(0, 2, 10.0, 1), 0.7, 0.95).unwrap();
        let expected = (1.0 - 0.7) * 0.0 + 0.7 * (10.0 + 0.95 * 4.0);
        assert_eq!(new_q, expected);
        assert_eq!(table.get(StateIndex(0), ActionIndex(2)).unwrap(), expected);
    }

    #[test]
    fn test_self_transition_reads_old_max() {
        let mut table = ValueTable::from_array(array![[2.0, 1.0]]);
        let new_q = table.update(&transition(0, 0, 1.0, 0), 0.5, 0.5).unwrap();
        assert_eq!(new_q, 0.5 * 2.0 + 0.5 * (1.0 + 0.5 * 2.0));
    }

    #[test]
    fn test_out_of_bounds_leaves_table_untouched() {
        let mut table = ValueTable::zeros((4, 3));
        let before = table.clone();
        assert!(matches!(
            table.update(&transition(4, 0, 1.0, 0), 0.5, 0.5),
            Err(RLError::IndexOutOfBounds { axis: "state", index: 4, len: 4 })
        ));
        assert!(matches!(
            table.update(&transition(0, 0, 1.0, 9), 0.5, 0.5),
            Err(RLError::IndexOutOfBounds { axis: "state", index: 9, .. })
        ));
        assert!(matches!(
            table.update(&transition(0, 3, 1.0, 0), 0.5, 0.5),
            Err(RLError::IndexOutOfBounds { axis: "action", index: 3, .. })
        ));
        assert!(table.best_action(StateIndex(7)).is_err());
        assert_eq!(table, before);
    }

    proptest! {
        #[test]
        fn prop_update_touches_exactly_one_cell(
            cells in proptest::collection::vec(-100.0f64..100.0, 12),
            s in 0usize..4,
            a in 0usize..3,
            next in 0usize..4,
            reward in -50.0f64..50.0,
            lr in 0.0f64..=1.0,
            gamma in 0.0f64..=1.0,
        ) {
            let before = ValueTable::from_array(Array2::from_shape_vec((4, 3), cells).unwrap());
            let mut table = before.clone();
            let old_q = before.get(StateIndex(s), ActionIndex(a)).unwrap();
            let max_next = before.max_value(StateIndex(next)).unwrap();

            table.update(&transition(s, a, reward, next), lr, gamma).unwrap();

            let expected = (1.0 - lr) * old_q + lr * (reward + gamma * max_next);
            for ((row, col), &value) in table.as_array().indexed_iter() {
                if (row, col) == (s, a) {
                    prop_assert_eq!(value, expected);
                } else {
                    prop_assert_eq!(value, before.as_array()[[row, col]]);
                }
            }
        }
    }
}
