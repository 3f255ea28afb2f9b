//! Delta type emitted by the distinct index.
//!
//! A Delta is a set-semantics correction for one key at one round: `+1`
//! when the key starts being present there, `-1` when it stops. Summed by
//! round, the deltas for a key are the first difference of its presence.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use tessera_core::{Multiplicity, Round};

/// A presence correction for a key at a round.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Delta<K> {
    /// The key whose presence changed
    pub key: K,
    /// Round at which the change takes effect
    pub round: Round,
    /// The correction: +1 for appearance, -1 for disappearance
    pub count: Multiplicity,
}

impl<K> Delta<K> {
    /// Creates a new delta.
    #[inline]
    pub fn new(key: K, round: Round, count: Multiplicity) -> Self {
        Self { key, round, count }
    }

    /// Creates an insertion delta (+1).
    #[inline]
    pub fn insert(key: K, round: Round) -> Self {
        Self::new(key, round, 1)
    }

    /// Creates a deletion delta (-1).
    #[inline]
    pub fn delete(key: K, round: Round) -> Self {
        Self::new(key, round, -1)
    }

    /// Returns true if this is an insertion (count > 0).
    #[inline]
    pub fn is_insert(&self) -> bool {
        self.count > 0
    }

    /// Returns true if this is a deletion (count < 0).
    #[inline]
    pub fn is_delete(&self) -> bool {
        self.count < 0
    }

    /// Maps the key to a new type.
    #[inline]
    pub fn map<U, F>(self, f: F) -> Delta<U>
    where
        F: FnOnce(K) -> U,
    {
        Delta {
            key: f(self.key),
            round: self.round,
            count: self.count,
        }
    }

    /// Negates the count (turns insert into delete and vice versa).
    #[inline]
    pub fn negate(self) -> Self {
        Self {
            count: -self.count,
            ..self
        }
    }
}

/// A batch of deltas.
pub type DeltaBatch<K> = Vec<Delta<K>>;

/// Extension trait for working with delta batches.
pub trait DeltaBatchExt<K> {
    /// Sums counts per (key, round), dropping entries that cancel out.
    fn consolidate(self) -> Self;

    /// Returns the net effect count (sum of all counts).
    fn net_count(&self) -> i64;
}

impl<K: Ord + Clone> DeltaBatchExt<K> for DeltaBatch<K> {
    fn consolidate(self) -> Self {
        let mut totals: BTreeMap<(K, Round), i64> = BTreeMap::new();
        for d in self {
            *totals.entry((d.key, d.round)).or_insert(0) += i64::from(d.count);
        }
        totals
            .into_iter()
            .filter(|(_, count)| *count != 0)
            .map(|((key, round), count)| Delta::new(key, round, count as Multiplicity))
            .collect()
    }

    fn net_count(&self) -> i64 {
        self.iter().map(|d| i64::from(d.count)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_delta_insert() {
        let d = Delta::insert(42, 3);
        assert!(d.is_insert());
        assert!(!d.is_delete());
        assert_eq!(d.count, 1);
        assert_eq!(d.round, 3);
    }

    #[test]
    fn test_delta_negate_and_map() {
        let d = Delta::insert(42, 1).negate();
        assert!(d.is_delete());
        let mapped = d.map(|k| k * 2);
        assert_eq!(mapped, Delta::delete(84, 1));
    }

    #[test]
    fn test_batch_consolidate() {
        let batch: DeltaBatch<u32> = vec![
            Delta::insert(1, 2),
            Delta::delete(1, 2),
            Delta::insert(1, 3),
            Delta::insert(2, 1),
        ];
        let consolidated = batch.consolidate();
        assert_eq!(consolidated, vec![Delta::insert(1, 3), Delta::insert(2, 1)]);
    }

    #[test]
    fn test_batch_net_count() {
        let batch: DeltaBatch<u32> = vec![Delta::insert(1, 1), Delta::insert(2, 1), Delta::delete(3, 2)];
        assert_eq!(batch.net_count(), 1);
    }
}
