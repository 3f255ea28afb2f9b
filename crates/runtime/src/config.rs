//! Session configuration.

use tessera_core::{Error, Result};
use tessera_index::DEFAULT_MIN_KEYS;

/// Tunables for an [`Evaluation`](crate::Evaluation).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluationConfig {
    /// Minimum keys per B-tree node in every index the session builds
    /// (default: 16, so nodes hold up to 32 keys).
    pub index_min_keys: usize,
}

impl EvaluationConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the B-tree minimum fill.
    pub fn with_index_min_keys(mut self, min_keys: usize) -> Self {
        self.index_min_keys = min_keys;
        self
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.index_min_keys == 0 {
            return Err(Error::invalid_config("index_min_keys must be at least 1"));
        }
        Ok(())
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            index_min_keys: DEFAULT_MIN_KEYS,
        }
    }
}
