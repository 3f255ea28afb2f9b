//! Key ranges for ordered index traversal.

/// A key range for index queries.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyRange<K> {
    /// All keys
    All,
    /// A single key (equality)
    Only(K),
    /// Keys >= lower bound
    LowerBound { value: K, exclusive: bool },
    /// Keys <= upper bound
    UpperBound { value: K, exclusive: bool },
    /// Keys between lower and upper bounds
    Bound {
        lower: K,
        upper: K,
        lower_exclusive: bool,
        upper_exclusive: bool,
    },
}

impl<K: Ord> KeyRange<K> {
    /// Creates a range for all keys.
    pub fn all() -> Self {
        KeyRange::All
    }

    /// Creates a range for a single key.
    pub fn only(key: K) -> Self {
        KeyRange::Only(key)
    }

    /// Creates a range with a lower bound.
    pub fn lower_bound(value: K, exclusive: bool) -> Self {
        KeyRange::LowerBound { value, exclusive }
    }

    /// Creates a range with an upper bound.
    pub fn upper_bound(value: K, exclusive: bool) -> Self {
        KeyRange::UpperBound { value, exclusive }
    }

    /// Creates a range with both bounds.
    pub fn bound(lower: K, upper: K, lower_exclusive: bool, upper_exclusive: bool) -> Self {
        KeyRange::Bound {
            lower,
            upper,
            lower_exclusive,
            upper_exclusive,
        }
    }

    /// Checks if a key is within this range.
    pub fn contains(&self, key: &K) -> bool {
        !self.is_below(key) && !self.is_above(key)
    }

    /// Returns true if `key` sorts before every key in the range.
    pub fn is_below(&self, key: &K) -> bool {
        match self {
            KeyRange::All | KeyRange::UpperBound { .. } => false,
            KeyRange::Only(k) => key < k,
            KeyRange::LowerBound { value, exclusive }
            | KeyRange::Bound {
                lower: value,
                lower_exclusive: exclusive,
                ..
            } => {
                if *exclusive {
                    key <= value
                } else {
                    key < value
                }
            }
        }
    }

    /// Returns true if `key` sorts after every key in the range.
    pub fn is_above(&self, key: &K) -> bool {
        match self {
            KeyRange::All | KeyRange::LowerBound { .. } => false,
            KeyRange::Only(k) => key > k,
            KeyRange::UpperBound { value, exclusive }
            | KeyRange::Bound {
                upper: value,
                upper_exclusive: exclusive,
                ..
            } => {
                if *exclusive {
                    key >= value
                } else {
                    key > value
                }
            }
        }
    }

    /// Returns true if no key in `[lower, upper]` can fall inside this range.
    pub fn is_disjoint(&self, lower: &K, upper: &K) -> bool {
        self.is_below(upper) || self.is_above(lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_bounds() {
        let range = KeyRange::bound(5, 10, false, true);
        assert!(!range.contains(&4));
        assert!(range.contains(&5));
        assert!(range.contains(&9));
        assert!(!range.contains(&10));

        let lower = KeyRange::lower_bound(5, true);
        assert!(!lower.contains(&5));
        assert!(lower.contains(&6));

        let upper = KeyRange::upper_bound(5, false);
        assert!(upper.contains(&5));
        assert!(!upper.contains(&6));

        assert!(KeyRange::only(3).contains(&3));
        assert!(!KeyRange::only(3).contains(&4));
        assert!(KeyRange::<i32>::all().contains(&i32::MIN));
    }

    #[test]
    fn test_below_above() {
        let range = KeyRange::bound([1, 0], [1, 9], false, false);
        assert!(range.is_below(&[0, 100]));
        assert!(!range.is_below(&[1, 0]));
        assert!(range.is_above(&[2, 0]));
        assert!(!range.is_above(&[1, 9]));
    }

    #[test]
    fn test_disjoint() {
        let range = KeyRange::bound(10, 20, false, false);
        assert!(range.is_disjoint(&0, &9));
        assert!(range.is_disjoint(&21, &30));
        assert!(!range.is_disjoint(&0, &10));
        assert!(!range.is_disjoint(&15, &100));
        assert!(!KeyRange::<i32>::all().is_disjoint(&0, &1));
    }
}
