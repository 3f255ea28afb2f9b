//! Incremental aggregate kinds.
//!
//! An aggregate kind maintains an opaque per-group state through `add` and
//! `remove`. Callers invoke them once per genuine membership transition of
//! a group (downstream of a distinct index), so `remove` must be the exact
//! inverse of `add`. Float sums are not invertible by subtraction, so `Sum`
//! and `Average` keep the multiset of their inputs instead of a running
//! total.

use alloc::collections::BTreeMap;
use core::cmp::Ordering;
use tessera_core::RawValue;

/// The incremental-state protocol every aggregate kind implements.
pub trait Aggregate {
    /// Per-group state.
    type State: Clone + PartialEq + core::fmt::Debug;

    /// Number of leading arguments that must resolve to numbers.
    const NUMERIC_ARGS: usize;

    /// Returns a short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Creates the state for a newly populated group.
    fn new_result_state(&self) -> Self::State;

    /// Folds one inserted member into the state.
    fn add(&self, state: Self::State, args: &[RawValue]) -> Self::State;

    /// Removes one retracted member from the state.
    fn remove(&self, state: Self::State, args: &[RawValue]) -> Self::State;

    /// Projects the state to the visible aggregate value.
    fn get_result(&self, state: &Self::State) -> RawValue;
}

fn first_number(args: &[RawValue]) -> f64 {
    args.first().and_then(RawValue::as_number).unwrap_or(0.0)
}

/// A number ordered and compared by `f64::total_cmp`, with `-0.0` folded
/// into `0.0` and every NaN folded into one.
#[derive(Clone, Copy, Debug)]
struct Number(f64);

impl Number {
    fn new(value: f64) -> Self {
        if value == 0.0 {
            Number(0.0)
        } else if value.is_nan() {
            Number(f64::NAN)
        } else {
            Number(value)
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Multiset of numbers with signed multiplicities.
///
/// `insert` and `remove` are exact inverses in any order. The sum is
/// computed from the multiset in ascending value order, so it depends only
/// on which values are present, never on the order they arrived in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NumberBag {
    values: BTreeMap<Number, i64>,
    len: i64,
}

impl NumberBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `value`.
    pub fn insert(&mut self, value: f64) {
        self.shift(value, 1);
    }

    /// Removes one occurrence of `value`.
    pub fn remove(&mut self, value: f64) {
        self.shift(value, -1);
    }

    fn shift(&mut self, value: f64, by: i64) {
        let key = Number::new(value);
        let count = self.values.entry(key).or_insert(0);
        *count += by;
        if *count == 0 {
            self.values.remove(&key);
        }
        self.len += by;
    }

    /// Net number of occurrences.
    pub fn len(&self) -> i64 {
        self.len
    }

    /// Returns true if no value has a nonzero multiplicity.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of every value times its multiplicity.
    pub fn sum(&self) -> f64 {
        self.values
            .iter()
            .fold(0.0, |acc, (value, &count)| acc + value.0 * count as f64)
    }
}

/// SUM over the first argument.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum;

impl Aggregate for Sum {
    type State = NumberBag;

    const NUMERIC_ARGS: usize = 1;

    fn name(&self) -> &'static str {
        "sum"
    }

    fn new_result_state(&self) -> NumberBag {
        NumberBag::new()
    }

    fn add(&self, mut state: NumberBag, args: &[RawValue]) -> NumberBag {
        state.insert(first_number(args));
        state
    }

    fn remove(&self, mut state: NumberBag, args: &[RawValue]) -> NumberBag {
        state.remove(first_number(args));
        state
    }

    fn get_result(&self, state: &NumberBag) -> RawValue {
        RawValue::Number(state.sum())
    }
}

/// COUNT of group members.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl Aggregate for Count {
    type State = i64;

    const NUMERIC_ARGS: usize = 0;

    fn name(&self) -> &'static str {
        "count"
    }

    fn new_result_state(&self) -> i64 {
        0
    }

    fn add(&self, state: i64, _args: &[RawValue]) -> i64 {
        state + 1
    }

    fn remove(&self, state: i64, _args: &[RawValue]) -> i64 {
        state - 1
    }

    fn get_result(&self, state: &i64) -> RawValue {
        RawValue::Number(*state as f64)
    }
}

/// AVG over the first argument.
#[derive(Clone, Copy, Debug, Default)]
pub struct Average;

impl Aggregate for Average {
    type State = NumberBag;

    const NUMERIC_ARGS: usize = 1;

    fn name(&self) -> &'static str {
        "average"
    }

    fn new_result_state(&self) -> NumberBag {
        NumberBag::new()
    }

    fn add(&self, mut state: NumberBag, args: &[RawValue]) -> NumberBag {
        state.insert(first_number(args));
        state
    }

    fn remove(&self, mut state: NumberBag, args: &[RawValue]) -> NumberBag {
        state.remove(first_number(args));
        state
    }

    fn get_result(&self, state: &NumberBag) -> RawValue {
        if state.len() == 0 {
            RawValue::Number(0.0)
        } else {
            RawValue::Number(state.sum() / state.len() as f64)
        }
    }
}
