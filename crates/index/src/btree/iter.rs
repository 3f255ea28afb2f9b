//! In-order iterator over a B-tree.

use super::node::{Node, NodeId};
use alloc::vec::Vec;

/// Iterator over the entries of an `OrderedIndex` in increasing key order.
///
/// Keeps an explicit stack of `(node, next key position)` frames. After
/// yielding key `i` of an internal node the leftmost path of child `i + 1`
/// is pushed.
pub struct Iter<'a, K, V> {
    /// Reference to the arena of nodes.
    arena: &'a [Node<K, V>],
    /// Pending frames, innermost last.
    stack: Vec<(NodeId, usize)>,
}

impl<'a, K, V> Iter<'a, K, V> {
    /// Creates a new iterator positioned before the smallest key under `root`.
    pub fn new(arena: &'a [Node<K, V>], root: NodeId) -> Self {
        let mut iter = Self {
            arena,
            stack: Vec::new(),
        };
        iter.descend_left(root);
        iter
    }

    /// Pushes `node` and its leftmost descendants.
    fn descend_left(&mut self, node: NodeId) {
        let mut current = node;
        loop {
            self.stack.push((current, 0));
            match self.arena[current].children.first() {
                Some(&child) => current = child,
                None => break,
            }
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node_id, pos) = self.stack.pop()?;
            let node = &self.arena[node_id];
            if pos >= node.keys.len() {
                continue;
            }
            self.stack.push((node_id, pos + 1));
            if let Some(&child) = node.children.get(pos + 1) {
                self.descend_left(child);
            }
            return Some((&node.keys[pos], &node.values[pos]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::OrderedIndex;
    use alloc::vec::Vec;

    #[test]
    fn test_iter_empty() {
        let tree: OrderedIndex<i32, ()> = OrderedIndex::new(2);
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn test_iter_sorted_across_levels() {
        let mut tree = OrderedIndex::new(2);
        for k in [50, 20, 80, 10, 30, 70, 90, 60, 40, 5, 15, 25, 35, 45, 55, 65] {
            tree.add(k, ());
        }
        assert!(tree.depth() >= 2);
        let keys: Vec<i32> = tree.iter().map(|(k, _)| *k).collect();
        let mut expected = keys.clone();
        expected.sort();
        assert_eq!(keys, expected);
        assert_eq!(keys.len(), 16);
    }
}
