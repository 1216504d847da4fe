//! Action indices and the ordered action vocabulary

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{RLError, Result};

/// Column index into the value table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionIndex(pub usize);

impl ActionIndex {
    /// Get the raw index
    #[must_use]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl From<usize> for ActionIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for ActionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered action vocabulary
///
/// The position of a name is its column in the value table, so the order
/// must not change between runs sharing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet {
    names: Vec<String>,
}

impl Default for ActionSet {
    fn default() -> Self {
        Self::new(["left", "right", "jump"])
    }
}

impl ActionSet {
    /// Create an action set from names in column order
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the action at `index`
    pub fn name(&self, index: ActionIndex) -> Result<&str> {
        self.names
            .get(index.0)
            .map(String::as_str)
            .ok_or_else(|| RLError::action_out_of_bounds(index.0, self.names.len()))
    }

    /// Sample an action uniformly at random
    ///
    /// # Panics
    ///
    /// Panics if the set is empty.
    pub fn sample(&self, rng: &mut dyn RngCore) -> ActionIndex {
        ActionIndex(rng.gen_range(0..self.names.len()))
    }

    /// Iterate over the names in column order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Check that names are unique
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.names
            .iter()
            .enumerate()
            .any(|(i, name)| self.names[..i].contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary_order() {
        let actions = ActionSet::default();
        assert_eq!(actions.iter().collect::<Vec<_>>(), ["left", "right", "jump"]);
        assert_eq!(actions.name(ActionIndex(1)).unwrap(), "right");
    }

    #[test]
    fn test_unknown_indices() {
        let actions = ActionSet::default();
        assert!(matches!(
            actions.name(ActionIndex(3)),
            Err(RLError::IndexOutOfBounds { axis: "action", index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_duplicates() {
        assert!(!ActionSet::default().has_duplicates());
        assert!(ActionSet::new(["left", "jump", "left"]).has_duplicates());
    }
}
