//! B-tree node definitions.

use alloc::vec::Vec;

/// Node identifier in the B-tree arena.
pub type NodeId = usize;

/// A node in the B-tree.
///
/// Internal nodes carry entries too: `keys[i]` separates `children[i]`
/// from `children[i + 1]`.
#[derive(Clone, Debug)]
pub struct Node<K, V> {
    /// Keys stored in this node, strictly increasing.
    pub keys: Vec<K>,
    /// Value for each key.
    pub values: Vec<V>,
    /// Child node IDs; empty for leaves, `keys.len() + 1` otherwise.
    pub children: Vec<NodeId>,
    /// Parent node ID; None for the root.
    pub parent: Option<NodeId>,
    /// Smallest key in this subtree.
    pub lower: Option<K>,
    /// Largest key in this subtree.
    pub upper: Option<K>,
}

impl<K: Ord + Clone, V> Node<K, V> {
    /// Creates a new empty leaf node.
    pub fn new_leaf() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
            parent: None,
            lower: None,
            upper: None,
        }
    }

    /// Returns true if this node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the number of keys in this node.
    #[inline]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Binary search for a key within this node.
    ///
    /// `Ok(ix)` is an exact match; `Err(ix)` is the insertion point, which is
    /// also the child to descend into.
    #[inline]
    pub fn search(&self, key: &K) -> Result<usize, usize> {
        self.keys.binary_search(key)
    }

    /// Inserts an entry at `ix` in a leaf.
    pub fn insert_at(&mut self, ix: usize, key: K, value: V) {
        debug_assert!(self.is_leaf());
        self.keys.insert(ix, key);
        self.values.insert(ix, value);
    }

    /// Removes and returns the entry at `ix`.
    pub fn remove_at(&mut self, ix: usize) -> (K, V) {
        (self.keys.remove(ix), self.values.remove(ix))
    }
}
