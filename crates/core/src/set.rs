//! Unordered collection of unique strings

use std::collections::HashSet;
use thiserror::Error;

/// Errors reported by [`Set`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    /// The value was already a member; the set is unchanged
    #[error("value already in set: {0}")]
    Duplicate(String),
}

/// A set of unique strings
///
/// Used as a membership index only: iteration order is unspecified.
#[derive(Debug, Clone, Default)]
pub struct Set {
    values: HashSet<String>,
}

impl Set {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new value
    ///
    /// Fails with [`SetError::Duplicate`] if the value is already present.
    pub fn add(&mut self, value: impl Into<String>) -> Result<(), SetError> {
        let value = value.into();
        if self.values.contains(&value) {
            return Err(SetError::Duplicate(value));
        }

        self.values.insert(value);
        Ok(())
    }

    /// Check if the set holds `value`
    pub fn has(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    /// Snapshot of all values, in no particular order
    pub fn values(&self) -> Vec<String> {
        self.values.iter().cloned().collect()
    }

    /// Remove every value
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
