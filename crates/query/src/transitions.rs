//! Presence over rounds.
//!
//! A `Transitions` value is the first difference of a presence indicator:
//! a sorted list of `(round, count)` steps whose running sum is the
//! indicator at each round. Facts in the store carry one, and a join
//! derivation carries the product of the transitions of the facts it used,
//! where the product of two steps lands on the later round.

use alloc::vec::Vec;
use tessera_core::{Multiplicity, Round};

/// Sorted `(round, count)` steps with no zero counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Transitions {
    steps: Vec<(Round, Multiplicity)>,
}

impl Transitions {
    /// Creates an empty series: never present.
    pub fn new() -> Self {
        Self::default()
    }

    /// Present from the first round on.
    pub fn always() -> Self {
        Self::single(0, 1)
    }

    /// A single step.
    pub fn single(round: Round, count: Multiplicity) -> Self {
        let mut transitions = Self::new();
        transitions.add(round, count);
        transitions
    }

    /// Builds a series from unsorted steps, summing steps that share a round.
    pub fn from_steps(steps: impl IntoIterator<Item = (Round, Multiplicity)>) -> Self {
        let mut steps: Vec<(Round, Multiplicity)> = steps.into_iter().collect();
        steps.sort_unstable_by_key(|&(round, _)| round);
        let mut merged: Vec<(Round, Multiplicity)> = Vec::with_capacity(steps.len());
        for (round, count) in steps {
            match merged.last_mut() {
                Some(last) if last.0 == round => last.1 += count,
                _ => merged.push((round, count)),
            }
        }
        merged.retain(|&(_, count)| count != 0);
        Self { steps: merged }
    }

    /// Adds `count` at `round`, dropping the step if it cancels out.
    pub fn add(&mut self, round: Round, count: Multiplicity) {
        if count == 0 {
            return;
        }
        match self.steps.binary_search_by_key(&round, |&(r, _)| r) {
            Ok(ix) => {
                self.steps[ix].1 += count;
                if self.steps[ix].1 == 0 {
                    self.steps.remove(ix);
                }
            }
            Err(ix) => self.steps.insert(ix, (round, count)),
        }
    }

    /// Returns the steps in round order.
    #[inline]
    pub fn steps(&self) -> &[(Round, Multiplicity)] {
        &self.steps
    }

    /// Returns true if there are no steps.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Running sum up to and including `round`.
    pub fn at(&self, round: Round) -> i64 {
        self.steps
            .iter()
            .take_while(|&&(r, _)| r <= round)
            .map(|&(_, count)| i64::from(count))
            .sum()
    }

    /// Running sum after the last step.
    pub fn total(&self) -> i64 {
        self.steps.iter().map(|&(_, count)| i64::from(count)).sum()
    }

    /// Pointwise product of the two running sums, as steps.
    pub fn product(&self, other: &Transitions) -> Transitions {
        Self::from_steps(self.steps.iter().flat_map(|&(r1, c1)| {
            other
                .steps
                .iter()
                .map(move |&(r2, c2)| (r1.max(r2), c1 * c2))
        }))
    }

    /// Pointwise sum of the two running sums.
    pub fn plus(&self, other: &Transitions) -> Transitions {
        Self::from_steps(self.steps.iter().chain(other.steps.iter()).copied())
    }

    /// The series with every step negated.
    pub fn negated(&self) -> Transitions {
        Self {
            steps: self.steps.iter().map(|&(round, count)| (round, -count)).collect(),
        }
    }

    /// Present exactly when this series is not.
    pub fn complement(&self) -> Transitions {
        Self::always().plus(&self.negated())
    }

    /// Present whenever at least one of `series` is positive.
    pub fn any_of<'a>(series: impl IntoIterator<Item = &'a Transitions>) -> Transitions {
        let summed = Self::from_steps(series.into_iter().flat_map(|t| t.steps.iter().copied()));
        let mut running = 0i64;
        let mut present = false;
        let mut steps = Vec::new();
        for &(round, count) in &summed.steps {
            running += i64::from(count);
            if (running > 0) != present {
                present = !present;
                steps.push((round, if present { 1 } else { -1 }));
            }
        }
        Self { steps }
    }
}
