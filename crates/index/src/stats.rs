//! Structural statistics for an ordered index.

/// Counters maintained by an `OrderedIndex`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of key/value entries.
    entries: usize,
    /// Node splits performed since creation.
    splits: usize,
    /// Sibling merges performed since creation.
    merges: usize,
    /// Key rotations (borrows from a sibling) performed since creation.
    rotations: usize,
}

impl IndexStats {
    /// Creates a new empty stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Returns the number of node splits.
    #[inline]
    pub fn splits(&self) -> usize {
        self.splits
    }

    /// Returns the number of sibling merges.
    #[inline]
    pub fn merges(&self) -> usize {
        self.merges
    }

    /// Returns the number of rotations.
    #[inline]
    pub fn rotations(&self) -> usize {
        self.rotations
    }

    pub(crate) fn add_entry(&mut self) {
        self.entries += 1;
    }

    pub(crate) fn remove_entry(&mut self) {
        self.entries -= 1;
    }

    pub(crate) fn record_split(&mut self) {
        self.splits += 1;
    }

    pub(crate) fn record_merge(&mut self) {
        self.merges += 1;
    }

    pub(crate) fn record_rotation(&mut self) {
        self.rotations += 1;
    }

    /// Resets the entry count; structural counters are kept.
    pub(crate) fn clear(&mut self) {
        self.entries = 0;
    }
}
