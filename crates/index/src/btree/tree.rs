//! B-tree implementation.

use super::iter::Iter;
use super::node::{Node, NodeId};
use crate::range::KeyRange;
use crate::stats::IndexStats;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// Default minimum fill per node (maximum is twice this).
pub const DEFAULT_MIN_KEYS: usize = 16;

/// Where a key lives, or would be inserted.
enum Slot {
    Found(NodeId, usize),
    Vacant(NodeId, usize),
}

/// An ordered key/value index backed by a classic B-tree.
///
/// Nodes live in an arena and refer to each other by `NodeId`, including
/// the parent link. Every non-root node holds between `min_keys` and
/// `max_keys = 2 * min_keys` keys and all leaves sit at the same depth.
#[derive(Clone, Debug)]
pub struct OrderedIndex<K, V> {
    /// Arena of all nodes.
    arena: Vec<Node<K, V>>,
    /// Arena slots released by merges and root collapses.
    free: Vec<NodeId>,
    /// Root node ID.
    root: NodeId,
    /// Minimum number of keys per non-root node.
    min_keys: usize,
    /// Maximum number of keys per node.
    max_keys: usize,
    /// Statistics for this index.
    stats: IndexStats,
}

impl<K: Ord + Clone, V> OrderedIndex<K, V> {
    /// Creates a new index whose nodes hold between `min_keys` and
    /// `2 * min_keys` keys.
    ///
    /// # Panics
    ///
    /// Panics if `min_keys` is zero.
    pub fn new(min_keys: usize) -> Self {
        assert!(min_keys > 0, "OrderedIndex requires min_keys >= 1");
        Self {
            arena: vec![Node::new_leaf()],
            free: Vec::new(),
            root: 0,
            min_keys,
            max_keys: min_keys * 2,
            stats: IndexStats::new(),
        }
    }

    /// Returns the minimum fill of non-root nodes.
    #[inline]
    pub fn min_keys(&self) -> usize {
        self.min_keys
    }

    /// Returns the maximum number of keys per node.
    #[inline]
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    /// Returns the statistics for this index.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.stats.entries()
    }

    /// Returns true if the index holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena[self.root].keys.is_empty()
    }

    /// Returns the number of levels from root to leaves.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.root;
        while !self.arena[current].is_leaf() {
            current = self.arena[current].children[0];
            depth += 1;
        }
        depth
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.locate(key) {
            Slot::Found(node, ix) => Some(&self.arena[node].values[ix]),
            Slot::Vacant(..) => None,
        }
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.locate(key) {
            Slot::Found(node, ix) => Some(&mut self.arena[node].values[ix]),
            Slot::Vacant(..) => None,
        }
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        matches!(self.locate(key), Slot::Found(..))
    }

    /// Adds an entry.
    ///
    /// If `key` is already present nothing changes and the existing value
    /// is returned; otherwise the entry is inserted and `None` is returned.
    pub fn add(&mut self, key: K, value: V) -> Option<&V> {
        match self.locate(&key) {
            Slot::Found(node, ix) => Some(&self.arena[node].values[ix]),
            Slot::Vacant(leaf, ix) => {
                self.arena[leaf].insert_at(ix, key, value);
                self.stats.add_entry();
                if self.arena[leaf].key_count() > self.max_keys {
                    self.split(leaf);
                } else {
                    self.refresh_upward(leaf);
                }
                None
            }
        }
    }

    /// Removes `key`, returning its value if it was present.
    ///
    /// Deleting from an internal node pulls the in-order successor up from
    /// the leftmost leaf of the right subtree, then rebalances that leaf.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let (node_id, ix) = match self.locate(key) {
            Slot::Found(node, ix) => (node, ix),
            Slot::Vacant(..) => return None,
        };
        self.stats.remove_entry();

        if self.arena[node_id].is_leaf() {
            let (_, value) = self.arena[node_id].remove_at(ix);
            self.rebalance(node_id);
            return Some(value);
        }

        let mut successor = self.arena[node_id].children[ix + 1];
        while !self.arena[successor].is_leaf() {
            successor = self.arena[successor].children[0];
        }
        let (succ_key, succ_value) = self.arena[successor].remove_at(0);
        let node = &mut self.arena[node_id];
        node.keys[ix] = succ_key;
        let value = core::mem::replace(&mut node.values[ix], succ_value);
        self.rebalance(successor);
        Some(value)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.free.clear();
        self.arena.push(Node::new_leaf());
        self.root = 0;
        self.stats.clear();
    }

    /// Returns the smallest entry.
    pub fn min(&self) -> Option<(&K, &V)> {
        let mut current = self.root;
        while !self.arena[current].is_leaf() {
            current = self.arena[current].children[0];
        }
        let node = &self.arena[current];
        Some((node.keys.first()?, node.values.first()?))
    }

    /// Returns the largest entry.
    pub fn max(&self) -> Option<(&K, &V)> {
        let mut current = self.root;
        while !self.arena[current].is_leaf() {
            let children = &self.arena[current].children;
            current = children[children.len() - 1];
        }
        let node = &self.arena[current];
        Some((node.keys.last()?, node.values.last()?))
    }

    /// Visits every entry in increasing key order.
    pub fn foreach<F: FnMut(&K, &V)>(&self, mut f: F) {
        self.visit(self.root, &mut f);
    }

    /// Visits every entry in decreasing key order.
    pub fn foreach_reverse<F: FnMut(&K, &V)>(&self, mut f: F) {
        self.visit_reverse(self.root, &mut f);
    }

    /// Visits the entries inside `range` in increasing key order.
    ///
    /// Subtrees whose cached bounds fall outside the range are skipped
    /// without being descended.
    pub fn range<F: FnMut(&K, &V)>(&self, range: &KeyRange<K>, mut f: F) {
        self.visit_range(self.root, range, &mut f);
    }

    /// Returns an in-order iterator over the entries.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.arena, self.root)
    }

    /// Returns all keys in increasing order.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        self.foreach(|k, _| keys.push(k.clone()));
        keys
    }

    /// Verifies the structural invariants of the tree.
    ///
    /// Checks key ordering, node fill, uniform leaf depth, parent links,
    /// cached bounds and the entry count. Returns a description of the
    /// first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.arena[self.root].parent.is_some() {
            return Err(format!("root {} has a parent", self.root));
        }
        let mut leaf_depth = None;
        let mut entries = 0;
        self.check_node(self.root, 1, &mut leaf_depth, &mut entries)?;
        if entries != self.len() {
            return Err(format!(
                "entry count mismatch: counted {}, stats report {}",
                entries,
                self.len()
            ));
        }
        Ok(())
    }

    /// Finds the node and position of `key`, or where it would be inserted.
    fn locate(&self, key: &K) -> Slot {
        let mut current = self.root;
        loop {
            let node = &self.arena[current];
            match node.search(key) {
                Ok(ix) => return Slot::Found(current, ix),
                Err(ix) => {
                    if node.is_leaf() {
                        return Slot::Vacant(current, ix);
                    }
                    current = node.children[ix];
                }
            }
        }
    }

    /// Allocates a node, reusing a freed arena slot when one is available.
    fn alloc_node(&mut self, node: Node<K, V>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.arena[id] = node;
                id
            }
            None => {
                self.arena.push(node);
                self.arena.len() - 1
            }
        }
    }

    /// Returns the position of `child` in `parent`'s child list.
    fn child_position(&self, parent: NodeId, child: NodeId) -> usize {
        match self.arena[parent].children.iter().position(|&c| c == child) {
            Some(pos) => pos,
            None => unreachable!("node {} is not a child of its parent {}", child, parent),
        }
    }

    /// Splits an overflowing node, promoting its median into the parent and
    /// continuing upward while parents overflow.
    fn split(&mut self, node_id: NodeId) {
        let mut node_id = node_id;
        loop {
            let node = &mut self.arena[node_id];
            let median = node.key_count() / 2;
            let right_keys = node.keys.split_off(median + 1);
            let right_values = node.values.split_off(median + 1);
            let right_children = if node.is_leaf() {
                Vec::new()
            } else {
                node.children.split_off(median + 1)
            };
            let sep_key = node.keys.remove(median);
            let sep_value = node.values.remove(median);
            let parent = node.parent;

            let right_id = self.alloc_node(Node {
                keys: right_keys,
                values: right_values,
                children: right_children,
                parent,
                lower: None,
                upper: None,
            });
            for ix in 0..self.arena[right_id].children.len() {
                let child = self.arena[right_id].children[ix];
                self.arena[child].parent = Some(right_id);
            }
            self.refresh_bounds(node_id);
            self.refresh_bounds(right_id);
            self.stats.record_split();

            match parent {
                None => {
                    let root_id = self.alloc_node(Node {
                        keys: vec![sep_key],
                        values: vec![sep_value],
                        children: vec![node_id, right_id],
                        parent: None,
                        lower: None,
                        upper: None,
                    });
                    self.arena[node_id].parent = Some(root_id);
                    self.arena[right_id].parent = Some(root_id);
                    self.root = root_id;
                    self.refresh_bounds(root_id);
                    tracing::debug!(depth = self.depth(), "ordered index: root split");
                    return;
                }
                Some(parent_id) => {
                    let pos = self.child_position(parent_id, node_id);
                    let parent = &mut self.arena[parent_id];
                    parent.keys.insert(pos, sep_key);
                    parent.values.insert(pos, sep_value);
                    parent.children.insert(pos + 1, right_id);
                    if parent.key_count() > self.max_keys {
                        node_id = parent_id;
                        continue;
                    }
                    self.refresh_upward(parent_id);
                    return;
                }
            }
        }
    }

    /// Restores minimum fill after a removal from `node_id`, rotating a key
    /// in from a sibling when one can spare it and merging otherwise.
    fn rebalance(&mut self, node_id: NodeId) {
        let mut node_id = node_id;
        loop {
            let parent_id = match self.arena[node_id].parent {
                Some(parent) => parent,
                None => {
                    self.collapse_root();
                    return;
                }
            };
            if self.arena[node_id].key_count() >= self.min_keys {
                self.refresh_upward(node_id);
                return;
            }

            let pos = self.child_position(parent_id, node_id);
            let sibling_count = self.arena[parent_id].children.len();

            if pos > 0 {
                let left_id = self.arena[parent_id].children[pos - 1];
                if self.arena[left_id].key_count() > self.min_keys {
                    self.borrow_from_left(node_id, left_id, parent_id, pos);
                    self.refresh_upward(parent_id);
                    return;
                }
            }

            if pos + 1 < sibling_count {
                let right_id = self.arena[parent_id].children[pos + 1];
                if self.arena[right_id].key_count() > self.min_keys {
                    self.borrow_from_right(node_id, right_id, parent_id, pos);
                    self.refresh_upward(parent_id);
                    return;
                }
            }

            if pos > 0 {
                let left_id = self.arena[parent_id].children[pos - 1];
                self.merge_nodes(left_id, node_id, parent_id, pos - 1);
            } else {
                let right_id = self.arena[parent_id].children[pos + 1];
                self.merge_nodes(node_id, right_id, parent_id, pos);
            }
            node_id = parent_id;
        }
    }

    /// Rotates right: the separator moves down into `node_id` and the left
    /// sibling's last entry moves up to replace it.
    fn borrow_from_left(&mut self, node_id: NodeId, left_id: NodeId, parent_id: NodeId, pos: usize) {
        let left = &mut self.arena[left_id];
        let last = left.key_count() - 1;
        let (key, value) = left.remove_at(last);
        let moved_child = left.children.pop();

        let parent = &mut self.arena[parent_id];
        let sep_key = core::mem::replace(&mut parent.keys[pos - 1], key);
        let sep_value = core::mem::replace(&mut parent.values[pos - 1], value);

        let node = &mut self.arena[node_id];
        node.keys.insert(0, sep_key);
        node.values.insert(0, sep_value);
        if let Some(child) = moved_child {
            node.children.insert(0, child);
            self.arena[child].parent = Some(node_id);
        }

        self.refresh_bounds(left_id);
        self.refresh_bounds(node_id);
        self.stats.record_rotation();
    }

    /// Rotates left: the separator moves down into `node_id` and the right
    /// sibling's first entry moves up to replace it.
    fn borrow_from_right(&mut self, node_id: NodeId, right_id: NodeId, parent_id: NodeId, pos: usize) {
        let right = &mut self.arena[right_id];
        let (key, value) = right.remove_at(0);
        let moved_child = if right.is_leaf() {
            None
        } else {
            Some(right.children.remove(0))
        };

        let parent = &mut self.arena[parent_id];
        let sep_key = core::mem::replace(&mut parent.keys[pos], key);
        let sep_value = core::mem::replace(&mut parent.values[pos], value);

        let node = &mut self.arena[node_id];
        node.keys.push(sep_key);
        node.values.push(sep_value);
        if let Some(child) = moved_child {
            node.children.push(child);
            self.arena[child].parent = Some(node_id);
        }

        self.refresh_bounds(right_id);
        self.refresh_bounds(node_id);
        self.stats.record_rotation();
    }

    /// Merges `right_id` and the separator at `sep_ix` into `left_id`.
    fn merge_nodes(&mut self, left_id: NodeId, right_id: NodeId, parent_id: NodeId, sep_ix: usize) {
        let parent = &mut self.arena[parent_id];
        let sep_key = parent.keys.remove(sep_ix);
        let sep_value = parent.values.remove(sep_ix);
        parent.children.remove(sep_ix + 1);

        let right = core::mem::replace(&mut self.arena[right_id], Node::new_leaf());
        for &child in &right.children {
            self.arena[child].parent = Some(left_id);
        }

        let left = &mut self.arena[left_id];
        left.keys.push(sep_key);
        left.values.push(sep_value);
        left.keys.extend(right.keys);
        left.values.extend(right.values);
        left.children.extend(right.children);

        self.free.push(right_id);
        self.refresh_bounds(left_id);
        self.stats.record_merge();
    }

    /// Replaces an empty internal root with its only child.
    fn collapse_root(&mut self) {
        let root = self.root;
        if self.arena[root].keys.is_empty() && !self.arena[root].is_leaf() {
            let child = self.arena[root].children[0];
            self.arena[child].parent = None;
            self.arena[root] = Node::new_leaf();
            self.free.push(root);
            self.root = child;
            tracing::debug!(depth = self.depth(), "ordered index: root collapsed");
        }
        self.refresh_bounds(self.root);
    }

    /// Recomputes the cached bounds of one node from its keys or children.
    fn refresh_bounds(&mut self, id: NodeId) {
        let node = &self.arena[id];
        let (lower, upper) = if node.is_leaf() {
            (node.keys.first().cloned(), node.keys.last().cloned())
        } else {
            let first = node.children[0];
            let last = node.children[node.children.len() - 1];
            (self.arena[first].lower.clone(), self.arena[last].upper.clone())
        };
        let node = &mut self.arena[id];
        node.lower = lower;
        node.upper = upper;
    }

    /// Recomputes cached bounds from `id` up to the root.
    fn refresh_upward(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            self.refresh_bounds(node);
            current = self.arena[node].parent;
        }
    }

    fn visit<F: FnMut(&K, &V)>(&self, id: NodeId, f: &mut F) {
        let node = &self.arena[id];
        for ix in 0..node.key_count() {
            if !node.is_leaf() {
                self.visit(node.children[ix], f);
            }
            f(&node.keys[ix], &node.values[ix]);
        }
        if let Some(&last) = node.children.last() {
            self.visit(last, f);
        }
    }

    fn visit_reverse<F: FnMut(&K, &V)>(&self, id: NodeId, f: &mut F) {
        let node = &self.arena[id];
        if let Some(&last) = node.children.last() {
            self.visit_reverse(last, f);
        }
        for ix in (0..node.key_count()).rev() {
            f(&node.keys[ix], &node.values[ix]);
            if !node.is_leaf() {
                self.visit_reverse(node.children[ix], f);
            }
        }
    }

    fn visit_range<F: FnMut(&K, &V)>(&self, id: NodeId, range: &KeyRange<K>, f: &mut F) {
        let node = &self.arena[id];
        match (&node.lower, &node.upper) {
            (Some(lower), Some(upper)) if !range.is_disjoint(lower, upper) => {}
            _ => return,
        }
        for ix in 0..node.key_count() {
            if !node.is_leaf() {
                self.visit_range(node.children[ix], range, f);
            }
            let key = &node.keys[ix];
            if range.is_above(key) {
                return;
            }
            if range.contains(key) {
                f(key, &node.values[ix]);
            }
        }
        if let Some(&last) = node.children.last() {
            self.visit_range(last, range, f);
        }
    }

    fn check_node(
        &self,
        id: NodeId,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        entries: &mut usize,
    ) -> Result<(), String> {
        let node = &self.arena[id];
        let count = node.key_count();
        *entries += count;

        if node.values.len() != count {
            return Err(format!("node {} has {} keys but {} values", id, count, node.values.len()));
        }
        if node.keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!("node {} keys are not strictly increasing", id));
        }
        if count > self.max_keys {
            return Err(format!("node {} overflows: {} > {}", id, count, self.max_keys));
        }
        if id != self.root && count < self.min_keys {
            return Err(format!("node {} underflows: {} < {}", id, count, self.min_keys));
        }

        let expected_lower = if node.is_leaf() {
            node.keys.first()
        } else {
            self.arena[node.children[0]].lower.as_ref()
        };
        let expected_upper = if node.is_leaf() {
            node.keys.last()
        } else {
            self.arena[node.children[node.children.len() - 1]].upper.as_ref()
        };
        if node.lower.as_ref() != expected_lower || node.upper.as_ref() != expected_upper {
            return Err(format!("node {} has stale lower/upper bounds", id));
        }

        if node.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(d) if d != depth => {
                    return Err(format!("leaf {} at depth {}, expected {}", id, depth, d));
                }
                Some(_) => {}
            }
            return Ok(());
        }

        if node.children.len() != count + 1 {
            return Err(format!(
                "node {} has {} keys but {} children",
                id,
                count,
                node.children.len()
            ));
        }
        for (ix, &child) in node.children.iter().enumerate() {
            let child_node = &self.arena[child];
            if child_node.parent != Some(id) {
                return Err(format!("child {} does not point back to parent {}", child, id));
            }
            if let (Some(upper), Some(key)) = (&child_node.upper, node.keys.get(ix)) {
                if upper >= key {
                    return Err(format!("child {} extends past separator {} of node {}", child, ix, id));
                }
            }
            if ix > 0 {
                if let Some(lower) = &child_node.lower {
                    if lower <= &node.keys[ix - 1] {
                        return Err(format!("child {} starts before separator {} of node {}", child, ix - 1, id));
                    }
                }
            }
            self.check_node(child, depth + 1, leaf_depth, entries)?;
        }
        Ok(())
    }
}

impl<K: Ord + Clone, V> Default for OrderedIndex<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_KEYS)
    }
}
