//! Tessera Incremental - Incremental view maintenance for the Tessera evaluation engine.
//!
//! This crate turns weighted (bag) changes into set-semantics changes and
//! maintains aggregate values on top of them.
//!
//! # Core Concepts
//!
//! - `Delta<K>`: A presence correction for a key at a round (+1 appears, -1 disappears)
//! - `DistinctIndex<K>`: Per-key round histories that emit the minimal corrections
//!   as weighted observations arrive, in any round order
//! - `Aggregate`: The add/remove/result protocol implemented by `Sum`, `Count`
//!   and `Average`
//!
//! # Example
//!
//! ```rust
//! use tessera_incremental::{Delta, DeltaBatchExt, DistinctIndex};
//!
//! let mut index = DistinctIndex::new();
//! let mut out = Vec::new();
//!
//! // Observed twice at round 1: present from round 1 on
//! index.distinct("fact", 1, 1, &mut out);
//! index.distinct("fact", 1, 1, &mut out);
//! assert_eq!(out, vec![Delta::insert("fact", 1)]);
//!
//! // Both occurrences retracted at round 2
//! index.distinct("fact", 2, -2, &mut out);
//! assert_eq!(out.consolidate(), vec![Delta::insert("fact", 1), Delta::delete("fact", 2)]);
//! ```

#![no_std]

extern crate alloc;

pub mod delta;
pub mod operators;

pub use delta::{Delta, DeltaBatch, DeltaBatchExt};
pub use operators::{Aggregate, Average, Count, DistinctHistory, DistinctIndex, NumberBag, Sum};
