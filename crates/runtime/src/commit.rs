//! Output of one evaluation commit.

use crate::aggregate::AggregateUpdate;
use alloc::vec::Vec;
use tessera_core::{Change, Identity};
use tessera_incremental::{Delta, DeltaBatchExt};

/// Everything a commit produced.
///
/// - `inputs`: Presence corrections for input facts
/// - `derived`: Facts derived by blocks, weighted by derivation count
/// - `distinct`: Set-semantics corrections for derived facts
/// - `aggregates`: Aggregate value changes per group
#[derive(Clone, Debug, Default)]
pub struct CommitResult {
    /// Presence corrections for input identities, in application order
    pub inputs: Vec<Delta<Identity>>,
    /// Derived changes, in derivation order
    pub derived: Vec<Change>,
    /// Presence corrections for derived identities
    pub distinct: Vec<Delta<Identity>>,
    /// Aggregate updates
    pub aggregates: Vec<AggregateUpdate>,
}

impl CommitResult {
    /// Creates an empty result.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing was derived.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.derived.is_empty() && self.distinct.is_empty() && self.aggregates.is_empty()
    }

    /// Returns the distinct corrections summed per (identity, round).
    pub fn consolidated(&self) -> Vec<Delta<Identity>> {
        self.distinct.clone().consolidate()
    }

    /// Returns identities that became present, from the consolidated corrections.
    pub fn added(&self) -> Vec<Identity> {
        self.consolidated()
            .into_iter()
            .filter(|d| d.is_insert())
            .map(|d| d.key)
            .collect()
    }

    /// Returns identities that stopped being present, from the consolidated corrections.
    pub fn removed(&self) -> Vec<Identity> {
        self.consolidated()
            .into_iter()
            .filter(|d| d.is_delete())
            .map(|d| d.key)
            .collect()
    }
}
