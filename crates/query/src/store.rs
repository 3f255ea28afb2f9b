//! The accumulated fact set the join engine scans.
//!
//! Each identity carries its presence over rounds as `Transitions`. The
//! identities are indexed in three permutations of their fields, each an
//! `OrderedIndex` keyed on `[Id; 4]`. A lookup picks the permutation whose
//! leading fields are bound by the pattern and walks only that key range.
//! An identity stays in the store while it has any transition, even if it
//! is absent at the latest round, because it still matters to earlier
//! rounds.

use crate::transitions::Transitions;
use alloc::vec::Vec;
use tessera_core::{Id, Identity, Multiplicity, Round};
use tessera_index::{KeyRange, OrderedIndex, DEFAULT_MIN_KEYS};

/// A lookup pattern: `Some(id)` fields must match, `None` fields are free.
pub type Pattern = [Option<Id>; 4];

/// Returns true if `identity` agrees with every bound field of `pattern`.
#[inline]
pub fn pattern_matches(pattern: &Pattern, identity: &Identity) -> bool {
    let fields = identity.to_array();
    pattern
        .iter()
        .zip(fields.iter())
        .all(|(want, have)| want.map_or(true, |w| w == *have))
}

/// Field order of one index permutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Permutation {
    Eavc,
    Avec,
    Veac,
}

impl Permutation {
    const ALL: [Permutation; 3] = [Permutation::Eavc, Permutation::Avec, Permutation::Veac];

    fn order(self) -> [usize; 4] {
        match self {
            Permutation::Eavc => [0, 1, 2, 3],
            Permutation::Avec => [1, 2, 0, 3],
            Permutation::Veac => [2, 0, 1, 3],
        }
    }

    fn key(self, fields: [Id; 4]) -> [Id; 4] {
        let o = self.order();
        [fields[o[0]], fields[o[1]], fields[o[2]], fields[o[3]]]
    }

    fn identity(self, key: &[Id; 4]) -> Identity {
        let o = self.order();
        let mut fields = [0; 4];
        for (slot, &position) in o.iter().enumerate() {
            fields[position] = key[slot];
        }
        Identity::from(fields)
    }

    /// Number of leading key fields bound by `pattern`.
    fn bound_prefix(self, pattern: &Pattern) -> usize {
        self.order()
            .iter()
            .take_while(|&&position| pattern[position].is_some())
            .count()
    }

    fn range(self, pattern: &Pattern) -> KeyRange<[Id; 4]> {
        let bound = self.bound_prefix(pattern);
        if bound == 0 {
            return KeyRange::all();
        }
        let o = self.order();
        let mut lower = [Id::MIN; 4];
        let mut upper = [Id::MAX; 4];
        for slot in 0..bound {
            let value = pattern[o[slot]].unwrap_or_default();
            lower[slot] = value;
            upper[slot] = value;
        }
        KeyRange::bound(lower, upper, false, false)
    }
}

/// Identities with their presence over rounds, indexed for pattern lookup.
#[derive(Clone, Debug)]
pub struct FactStore {
    eavc: OrderedIndex<[Id; 4], Transitions>,
    avec: OrderedIndex<[Id; 4], ()>,
    veac: OrderedIndex<[Id; 4], ()>,
    present: usize,
}

impl FactStore {
    /// Creates an empty store with the default node size.
    pub fn new() -> Self {
        Self::with_min_keys(DEFAULT_MIN_KEYS)
    }

    /// Creates an empty store whose indexes use `min_keys` per node.
    pub fn with_min_keys(min_keys: usize) -> Self {
        Self {
            eavc: OrderedIndex::new(min_keys),
            avec: OrderedIndex::new(min_keys),
            veac: OrderedIndex::new(min_keys),
            present: 0,
        }
    }

    fn secondary_mut(&mut self, permutation: Permutation) -> &mut OrderedIndex<[Id; 4], ()> {
        match permutation {
            Permutation::Avec => &mut self.avec,
            _ => &mut self.veac,
        }
    }

    /// Adds a presence step for `identity`.
    ///
    /// Steps are set-semantics corrections (normally +1 or -1 from a
    /// distinct index), not raw multiplicities.
    pub fn apply(&mut self, identity: &Identity, round: Round, count: Multiplicity) {
        if count == 0 {
            return;
        }
        let key = identity.to_array();
        let (tracked, was_present, now_present, now_empty) = match self.eavc.get_mut(&key) {
            Some(transitions) => {
                let was_present = transitions.total() > 0;
                transitions.add(round, count);
                (true, was_present, transitions.total() > 0, transitions.is_empty())
            }
            None => (false, false, count > 0, false),
        };
        if !tracked {
            self.eavc.add(key, Transitions::single(round, count));
            for permutation in [Permutation::Avec, Permutation::Veac] {
                self.secondary_mut(permutation).add(permutation.key(key), ());
            }
        } else if now_empty {
            self.eavc.delete(&key);
            for permutation in [Permutation::Avec, Permutation::Veac] {
                self.secondary_mut(permutation).delete(&permutation.key(key));
            }
        }
        match (was_present, now_present) {
            (false, true) => self.present += 1,
            (true, false) => self.present -= 1,
            _ => {}
        }
    }

    /// Returns the presence steps of `identity`, if it has any.
    pub fn transitions(&self, identity: &Identity) -> Option<&Transitions> {
        self.eavc.get(&identity.to_array())
    }

    /// Returns true if `identity` is present at the latest round.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.transitions(identity).map_or(false, |t| t.total() > 0)
    }

    /// Returns true if `identity` is present at `round`.
    pub fn is_present(&self, identity: &Identity, round: Round) -> bool {
        self.transitions(identity).map_or(false, |t| t.at(round) > 0)
    }

    /// Returns the number of identities present at the latest round.
    pub fn len(&self) -> usize {
        self.present
    }

    /// Returns true if no identity is present at the latest round.
    pub fn is_empty(&self) -> bool {
        self.present == 0
    }

    /// Returns the number of identities with any presence history.
    pub fn tracked(&self) -> usize {
        self.eavc.len()
    }

    /// Visits every tracked identity matching `pattern`.
    pub fn for_each_match<F: FnMut(Identity, &Transitions)>(&self, pattern: &Pattern, mut f: F) {
        let permutation = Permutation::ALL
            .into_iter()
            .max_by_key(|p| p.bound_prefix(pattern))
            .unwrap_or(Permutation::Eavc);
        let range = permutation.range(pattern);
        match permutation {
            Permutation::Eavc => self.eavc.range(&range, |key, transitions| {
                let identity = Identity::from(*key);
                if pattern_matches(pattern, &identity) {
                    f(identity, transitions);
                }
            }),
            Permutation::Avec | Permutation::Veac => {
                let index = if permutation == Permutation::Avec {
                    &self.avec
                } else {
                    &self.veac
                };
                index.range(&range, |key, _| {
                    let identity = permutation.identity(key);
                    if !pattern_matches(pattern, &identity) {
                        return;
                    }
                    if let Some(transitions) = self.eavc.get(&identity.to_array()) {
                        f(identity, transitions);
                    }
                });
            }
        }
    }

    /// Returns every tracked identity matching `pattern`, in index order.
    pub fn matches(&self, pattern: &Pattern) -> Vec<Identity> {
        let mut found = Vec::new();
        self.for_each_match(pattern, |identity, _| found.push(identity));
        found
    }

    /// Visits every tracked identity with its presence steps, in EAVC order.
    pub fn foreach<F: FnMut(Identity, &Transitions)>(&self, mut f: F) {
        self.eavc.foreach(|key, transitions| f(Identity::from(*key), transitions));
    }

    /// Returns the identities present at the latest round, in EAVC order.
    pub fn facts(&self) -> Vec<Identity> {
        let mut facts = Vec::with_capacity(self.present);
        self.foreach(|identity, transitions| {
            if transitions.total() > 0 {
                facts.push(identity);
            }
        });
        facts
    }
}

impl Default for FactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn fact(e: Id, a: Id, v: Id) -> Identity {
        Identity::new(e, a, v, 0)
    }

    fn sample() -> FactStore {
        let mut store = FactStore::with_min_keys(2);
        for e in 1..=5 {
            store.apply(&fact(e, 10, e * 100), 1, 1);
            store.apply(&fact(e, 11, 7), 1, 1);
        }
        store
    }

    #[test]
    fn test_presence_by_round() {
        let mut store = FactStore::new();
        let f = fact(1, 2, 3);
        store.apply(&f, 2, 1);
        assert!(!store.is_present(&f, 1));
        assert!(store.is_present(&f, 2));
        assert!(store.contains(&f));
        assert_eq!(store.len(), 1);

        store.apply(&f, 4, -1);
        assert!(store.is_present(&f, 3));
        assert!(!store.is_present(&f, 4));
        assert!(!store.contains(&f));
        assert_eq!(store.len(), 0);
        assert_eq!(store.tracked(), 1);
        assert_eq!(store.matches(&[Some(1), None, None, None]), vec![f]);

        store.apply(&f, 2, -1);
        store.apply(&f, 4, 1);
        assert_eq!(store.tracked(), 0);
        assert!(store.transitions(&f).is_none());
        assert!(store.matches(&[None, None, Some(3), None]).is_empty());
    }

    #[test]
    fn test_zero_step_is_ignored() {
        let mut store = FactStore::new();
        store.apply(&fact(1, 2, 3), 1, 0);
        assert_eq!(store.tracked(), 0);
    }

    #[test]
    fn test_match_by_entity() {
        let store = sample();
        let found = store.matches(&[Some(3), None, None, None]);
        assert_eq!(found, vec![fact(3, 10, 300), fact(3, 11, 7)]);
    }

    #[test]
    fn test_match_by_attribute_value() {
        let store = sample();
        let found = store.matches(&[None, Some(11), Some(7), None]);
        assert_eq!(found.len(), 5);
        assert!(found.iter().all(|i| i.attribute == 11));
    }

    #[test]
    fn test_match_by_value_only() {
        let store = sample();
        let found = store.matches(&[None, None, Some(200), None]);
        assert_eq!(found, vec![fact(2, 10, 200)]);
    }

    #[test]
    fn test_match_by_context_filters() {
        let mut store = sample();
        store.apply(&Identity::new(1, 10, 100, 9), 1, 1);
        let found = store.matches(&[None, None, None, Some(9)]);
        assert_eq!(found, vec![Identity::new(1, 10, 100, 9)]);
    }

    #[test]
    fn test_permutations_roundtrip() {
        let fields = [4, 5, 6, 7];
        for permutation in Permutation::ALL {
            let key = permutation.key(fields);
            assert_eq!(permutation.identity(&key), Identity::from(fields));
        }
        assert_eq!(Permutation::Veac.key(fields), [6, 4, 5, 7]);
    }

    #[test]
    fn test_facts_in_order() {
        let mut store = sample();
        store.apply(&fact(9, 9, 9), 1, 1);
        store.apply(&fact(9, 9, 9), 3, -1);
        let facts = store.facts();
        assert_eq!(facts.len(), 10);
        assert!(facts.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(store.len(), 10);
        assert_eq!(store.tracked(), 11);
    }
}
