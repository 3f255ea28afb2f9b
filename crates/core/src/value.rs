//! Raw value definitions.
//!
//! A `RawValue` is what the outside world hands the engine before interning:
//! either a number or a string. Numbers and strings live in separate
//! namespaces, so `1` and `"1"` are different values.

use alloc::string::{String, ToString};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// An uninterned value.
#[derive(Clone, Debug)]
pub enum RawValue {
    /// Numeric value
    Number(f64),
    /// UTF-8 string
    String(String),
}

impl RawValue {
    /// Returns the number if this is a Number, None otherwise.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::String(_) => None,
        }
    }

    /// Returns a reference to the string if this is a String, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s.as_str()),
            RawValue::Number(_) => None,
        }
    }

    /// Returns true if this is a Number.
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, RawValue::Number(_))
    }
}

/// Canonical bit pattern of a number, used for hashing and equality.
///
/// `-0.0` folds into `0.0` and every NaN folds into one NaN.
#[inline]
pub(crate) fn number_bits(n: f64) -> u64 {
    if n == 0.0 {
        0.0f64.to_bits()
    } else if n.is_nan() {
        f64::NAN.to_bits()
    } else {
        n.to_bits()
    }
}

impl PartialEq for RawValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RawValue::Number(a), RawValue::Number(b)) => number_bits(*a) == number_bits(*b),
            (RawValue::String(a), RawValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for RawValue {}

impl Hash for RawValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            RawValue::Number(n) => number_bits(*n).hash(state),
            RawValue::String(s) => s.hash(state),
        }
    }
}

impl PartialOrd for RawValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RawValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (RawValue::Number(a), RawValue::Number(b)) => {
                f64::from_bits(number_bits(*a)).total_cmp(&f64::from_bits(number_bits(*b)))
            }
            (RawValue::String(a), RawValue::String(b)) => a.cmp(b),
            // Numbers sort before strings
            (RawValue::Number(_), RawValue::String(_)) => Ordering::Less,
            (RawValue::String(_), RawValue::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Number(v as f64)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Number(v as f64)
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::String(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::String(v.to_string())
    }
}
