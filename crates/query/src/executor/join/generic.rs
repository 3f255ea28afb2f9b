//! Generic join over a fact store.

use crate::executor::constraint::{Constraint, NotScan};
use crate::executor::scan::{ApplyInput, Scan};
use crate::prefix::Prefix;
use crate::store::{pattern_matches, FactStore, Pattern};
use crate::transitions::Transitions;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use tessera_core::{Identity, Interner, Multiplicity, Round};

/// A change in how often a complete prefix is derived, at one round.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Derivation {
    /// The complete binding.
    pub prefix: Prefix,
    /// Round at which the change takes effect.
    pub round: Round,
    /// Signed number of derivations gained or lost.
    pub count: Multiplicity,
}

/// A presence step being applied to one identity.
#[derive(Clone, Copy, Debug)]
struct Edit<'a> {
    identity: &'a Identity,
    round: Round,
    count: Multiplicity,
}

/// Read-only state shared by one solve.
///
/// Factors are numbered scans first, then negations. Factors before
/// `seeded` see the store with the edit applied, factors after it see the
/// store without it.
struct Frame<'a> {
    store: &'a FactStore,
    interner: &'a Interner,
    edit: Option<Edit<'a>>,
    seeded: usize,
}

impl<'a> Frame<'a> {
    fn batch(store: &'a FactStore, interner: &'a Interner) -> Self {
        Self {
            store,
            interner,
            edit: None,
            seeded: usize::MAX,
        }
    }

    /// The edit to undo for `factor`, if it sees the store before the edit.
    fn before(&self, factor: usize) -> Option<Edit<'a>> {
        self.edit.filter(|_| factor > self.seeded)
    }

    /// Identities matching `pattern` with their transitions, optionally
    /// with `before` undone.
    fn candidates(&self, pattern: &Pattern, before: Option<Edit<'_>>) -> Vec<(Identity, Transitions)> {
        let mut found = Vec::new();
        let mut saw_edit = false;
        self.store.for_each_match(pattern, |identity, transitions| {
            let mut transitions = transitions.clone();
            if let Some(edit) = before {
                if identity == *edit.identity {
                    saw_edit = true;
                    transitions.add(edit.round, -edit.count);
                }
            }
            if !transitions.is_empty() {
                found.push((identity, transitions));
            }
        });
        if let Some(edit) = before {
            if !saw_edit && pattern_matches(pattern, edit.identity) {
                found.push((*edit.identity, Transitions::single(edit.round, -edit.count)));
            }
        }
        found
    }
}

/// Generic join executor.
///
/// Extends a prefix one scan at a time: each scan is resolved against the
/// bindings made so far, every matching fact extends the prefix with the
/// scan's unbound registers, and complete prefixes that pass every
/// constraint are weighted by the negations and emitted.
///
/// Every derivation carries the product of the presence transitions of the
/// facts it used, so it is present exactly at the rounds where all of them
/// are present and no negated pattern matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericJoin {
    scans: Vec<Scan>,
    constraints: Vec<Constraint>,
    negations: Vec<NotScan>,
}

impl GenericJoin {
    /// Creates a join over `scans`, evaluated in order.
    pub fn new(scans: Vec<Scan>) -> Self {
        Self {
            scans,
            constraints: Vec::new(),
            negations: Vec::new(),
        }
    }

    /// Adds filters checked on every complete prefix.
    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// Adds patterns that must not match any present fact.
    pub fn with_negations(mut self, negations: Vec<NotScan>) -> Self {
        self.negations.extend(negations);
        self
    }

    /// Returns the scans.
    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }

    /// Returns the constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns the negated patterns.
    pub fn negations(&self) -> &[NotScan] {
        &self.negations
    }

    /// Returns every extension of `prefix` that holds at the latest round,
    /// in prefix order.
    pub fn exec(&self, store: &FactStore, interner: &Interner, prefix: &Prefix) -> Vec<Prefix> {
        let mut totals: BTreeMap<Prefix, i64> = BTreeMap::new();
        for derivation in self.derivations(store, interner, prefix) {
            *totals.entry(derivation.prefix).or_insert(0) += i64::from(derivation.count);
        }
        totals
            .into_iter()
            .filter(|&(_, total)| total > 0)
            .map(|(prefix, _)| prefix)
            .collect()
    }

    /// Returns the full round-by-round derivation history of every
    /// extension of `prefix`.
    pub fn derivations(&self, store: &FactStore, interner: &Interner, prefix: &Prefix) -> Vec<Derivation> {
        let frame = Frame::batch(store, interner);
        let order: Vec<usize> = (0..self.scans.len()).collect();
        let mut out = BTreeMap::new();
        self.solve(&frame, &order, prefix.clone(), Transitions::always(), &mut out);
        collect(out)
    }

    /// Returns the derivations gained or lost because `identity` received
    /// the presence step `(round, count)`.
    ///
    /// `store` must already contain the step. The step is seeded into every
    /// scan and every negation it matches; factors before the seeded one see
    /// the store with the step and factors after it see the store without,
    /// so each derivation is counted exactly once.
    pub fn apply_input(
        &self,
        store: &FactStore,
        interner: &Interner,
        identity: &Identity,
        round: Round,
        count: Multiplicity,
        prefix: &Prefix,
    ) -> Vec<Derivation> {
        let mut out = BTreeMap::new();
        if count != 0 {
            let edit = Some(Edit {
                identity,
                round,
                count,
            });
            for (seeded, scan) in self.scans.iter().enumerate() {
                let mut start = prefix.clone();
                if scan.apply_input(identity, &mut start) != ApplyInput::Bound {
                    continue;
                }
                let order: Vec<usize> = (0..self.scans.len()).filter(|&ix| ix != seeded).collect();
                let frame = Frame {
                    store,
                    interner,
                    edit,
                    seeded,
                };
                self.solve(&frame, &order, start, Transitions::single(round, count), &mut out);
            }

            let base = self.scans.len();
            for (ix, negation) in self.negations.iter().enumerate() {
                let mut start = prefix.clone();
                if !negation.seed(identity, &mut start) {
                    continue;
                }
                let order: Vec<usize> = (0..base).collect();
                let frame = Frame {
                    store,
                    interner,
                    edit,
                    seeded: base + ix,
                };
                self.solve(&frame, &order, start, Transitions::always(), &mut out);
            }
        }
        let derived = collect(out);
        tracing::trace!(round, count, derived = derived.len(), "join maintenance");
        derived
    }

    fn solve(
        &self,
        frame: &Frame<'_>,
        order: &[usize],
        prefix: Prefix,
        weight: Transitions,
        out: &mut BTreeMap<(Prefix, Round), Multiplicity>,
    ) {
        let Some((&ix, rest)) = order.split_first() else {
            self.finish(frame, prefix, weight, out);
            return;
        };
        let scan = &self.scans[ix];
        let pattern = scan.resolve(&prefix);
        for (candidate, transitions) in frame.candidates(&pattern, frame.before(ix)) {
            let mut next = prefix.clone();
            if scan.apply_input(&candidate, &mut next) != ApplyInput::Bound {
                continue;
            }
            let next_weight = weight.product(&transitions);
            if !next_weight.is_empty() {
                self.solve(frame, rest, next, next_weight, out);
            }
        }
    }

    fn finish(
        &self,
        frame: &Frame<'_>,
        prefix: Prefix,
        mut weight: Transitions,
        out: &mut BTreeMap<(Prefix, Round), Multiplicity>,
    ) {
        if !self.constraints.iter().all(|c| c.test(&prefix, frame.interner)) {
            return;
        }

        let base = self.scans.len();
        for (ix, negation) in self.negations.iter().enumerate() {
            let factor = base + ix;
            let pattern = negation.resolve(&prefix);
            let absence = if factor == frame.seeded {
                // Change in absence: matched before minus matched after.
                let after = frame.candidates(&pattern, None);
                let before = frame.candidates(&pattern, frame.edit);
                Transitions::any_of(before.iter().map(|(_, t)| t))
                    .plus(&Transitions::any_of(after.iter().map(|(_, t)| t)).negated())
            } else {
                let matched = frame.candidates(&pattern, frame.before(factor));
                Transitions::any_of(matched.iter().map(|(_, t)| t)).complement()
            };
            weight = weight.product(&absence);
            if weight.is_empty() {
                return;
            }
        }

        for &(round, count) in weight.steps() {
            *out.entry((prefix.clone(), round)).or_insert(0) += count;
        }
    }
}

fn collect(out: BTreeMap<(Prefix, Round), Multiplicity>) -> Vec<Derivation> {
    out.into_iter()
        .filter(|&(_, count)| count != 0)
        .map(|((prefix, round), count)| Derivation { prefix, round, count })
        .collect()
}
