//! Tessera Index - Ordered index for the Tessera evaluation engine.
//!
//! This crate provides `OrderedIndex`, a classic B-tree keyed on any ordered
//! key (composite keys such as `[Id; 4]` compare lexicographically). It backs
//! the fact store the join engine scans, and has no query-specific logic.
//!
//! - Point lookup, idempotent insertion and deletion with rebalancing
//! - In-order and reverse traversal
//! - Range traversal pruned by per-node cached `lower`/`upper` bounds
//!
//! # Example
//!
//! ```rust
//! use tessera_index::{KeyRange, OrderedIndex};
//!
//! let mut index: OrderedIndex<[u32; 2], &str> = OrderedIndex::new(2);
//! index.add([1, 2], "a");
//! index.add([1, 5], "b");
//! index.add([3, 0], "c");
//!
//! // Re-adding returns the existing value and changes nothing
//! assert_eq!(index.add([1, 2], "z"), Some(&"a"));
//!
//! // Prefix scan over keys starting with 1
//! let mut found = Vec::new();
//! index.range(&KeyRange::bound([1, 0], [1, u32::MAX], false, false), |_, v| found.push(*v));
//! assert_eq!(found, vec!["a", "b"]);
//! ```

#![no_std]

extern crate alloc;

pub mod btree;
pub mod range;
pub mod stats;

pub use btree::{Iter, Node, NodeId, OrderedIndex, DEFAULT_MIN_KEYS};
pub use range::KeyRange;
pub use stats::IndexStats;
