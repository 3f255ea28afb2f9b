//! Incremental distinct operator.
//!
//! Converts multiplicity-weighted observations into set-semantics
//! presence deltas, one observation at a time.

use crate::delta::Delta;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::hash::Hash;
use core::ops::Bound::{Excluded, Unbounded};
use hashbrown::HashMap;
use tessera_core::{Multiplicity, Round};

/// Accumulated weight per round for one key.
///
/// A key is present at round `r` while the sum of the weights of all rounds
/// `<= r` is positive. Rounds whose weight sums back to zero are removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinctHistory {
    rounds: BTreeMap<Round, i64>,
}

impl DistinctHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the summed weight observed at exactly `round`.
    pub fn weight(&self, round: Round) -> i64 {
        self.rounds.get(&round).copied().unwrap_or(0)
    }

    /// Returns the summed weight of all rounds up to and including `round`.
    pub fn cumulative(&self, round: Round) -> i64 {
        self.rounds.range(..=round).map(|(_, w)| *w).sum()
    }

    /// Returns true if the key is present at `round`.
    pub fn is_present(&self, round: Round) -> bool {
        self.cumulative(round) > 0
    }

    /// Iterates over `(round, weight)` pairs with nonzero weight, in round order.
    pub fn rounds(&self) -> impl Iterator<Item = (Round, i64)> + '_ {
        self.rounds.iter().map(|(&r, &w)| (r, w))
    }

    /// Returns the number of rounds with nonzero weight.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Returns true if no round carries weight.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Applies one observation and reports each presence correction.
    ///
    /// Only rounds at or after `round` can change. For each of them the
    /// first difference of the presence indicator is computed with and
    /// without the observation; where the two disagree, the difference is
    /// the correction to emit.
    fn observe<F>(&mut self, round: Round, count: Multiplicity, mut emit: F)
    where
        F: FnMut(Round, Multiplicity),
    {
        let count = i64::from(count);
        let base: i64 = self.rounds.range(..round).map(|(_, w)| *w).sum();
        let current = self.weight(round);

        let later = self
            .rounds
            .range((Excluded(round), Unbounded))
            .map(|(&r, &w)| (r, w, w));

        let mut old_cum = base;
        let mut new_cum = base;
        let mut old_prev = base > 0;
        let mut new_prev = old_prev;

        for (r, old_w, new_w) in core::iter::once((round, current, current + count)).chain(later) {
            old_cum += old_w;
            new_cum += new_w;
            let old_now = old_cum > 0;
            let new_now = new_cum > 0;
            let old_diff = old_now as Multiplicity - old_prev as Multiplicity;
            let new_diff = new_now as Multiplicity - new_prev as Multiplicity;
            if old_diff != new_diff {
                emit(r, new_diff - old_diff);
            }
            old_prev = old_now;
            new_prev = new_now;
        }

        let weight = current + count;
        if weight == 0 {
            self.rounds.remove(&round);
        } else {
            self.rounds.insert(round, weight);
        }
    }
}

/// Incremental distinct over keys of type `K`.
///
/// Every call to [`distinct`](Self::distinct) takes one weighted
/// observation of a key and emits the minimal deltas that keep the summed
/// output equal to the first difference of the key's presence over rounds.
/// Observations for the same key may arrive in any round order.
#[derive(Clone, Debug)]
pub struct DistinctIndex<K>
where
    K: Eq + Hash,
{
    histories: HashMap<K, DistinctHistory>,
}

impl<K> DistinctIndex<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty distinct index.
    pub fn new() -> Self {
        Self {
            histories: HashMap::new(),
        }
    }

    /// Applies an observation of `key` with weight `count` at `round`,
    /// pushing the resulting corrections onto `out`.
    pub fn distinct(&mut self, key: K, round: Round, count: Multiplicity, out: &mut Vec<Delta<K>>) {
        if count == 0 {
            return;
        }
        let history = self.histories.entry(key.clone()).or_default();
        history.observe(round, count, |r, c| {
            tracing::trace!(round = r, count = c, "distinct correction");
            out.push(Delta::new(key.clone(), r, c));
        });
        if history.is_empty() {
            self.histories.remove(&key);
        }
    }

    /// Returns the history for `key`, if it has any nonzero weight.
    pub fn history(&self, key: &K) -> Option<&DistinctHistory> {
        self.histories.get(key)
    }

    /// Iterates over every key with a live history, in no particular order.
    pub fn histories(&self) -> impl Iterator<Item = (&K, &DistinctHistory)> {
        self.histories.iter()
    }

    /// Returns the weight observed for `key` at exactly `round`.
    pub fn weight(&self, key: &K, round: Round) -> i64 {
        self.histories.get(key).map_or(0, |h| h.weight(round))
    }

    /// Returns true if `key` is present at `round`.
    pub fn is_present(&self, key: &K, round: Round) -> bool {
        self.histories.get(key).is_some_and(|h| h.is_present(round))
    }

    /// Returns the number of keys with a live history.
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    /// Returns true if no key has a live history.
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Drops every history.
    pub fn clear(&mut self) {
        self.histories.clear();
    }
}

impl<K> Default for DistinctIndex<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
