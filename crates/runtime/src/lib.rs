//! Tessera Runtime - Evaluation sessions for the Tessera engine.
//!
//! This crate wires the other crates into the data flow of one session:
//! input changes pass through a distinct index into per-round presence
//! corrections, each correction updates the fact store, blocks derive new
//! facts through the generic join's maintenance mode, derived facts pass
//! through a second distinct index, and aggregate nodes fold the join
//! results per group.
//!
//! # Core Concepts
//!
//! - `EvaluationConfig`: Session tunables
//! - `Evaluation`: Owns the interner, store, blocks and aggregates; `commit` applies changes
//! - `CommitResult`: Input corrections, derived changes, distinct corrections and aggregate updates
//! - `AggregateNode`: A grouped aggregate of any `Aggregate` kind
//!
//! # Example
//!
//! ```rust
//! use tessera_core::Change;
//! use tessera_query::{Block, Field, Output, Scan};
//! use tessera_runtime::{Evaluation, EvaluationConfig};
//!
//! let mut eval = Evaluation::new(EvaluationConfig::default()).unwrap();
//! let follows = eval.intern("follows");
//! let followed_by = eval.intern("followed-by");
//! let (a, b) = (eval.intern("a"), eval.intern("b"));
//!
//! let block = Block::new(
//!     "inverse",
//!     vec![Scan::eav(Field::Variable(0), Field::Constant(follows), Field::Variable(1))],
//!     vec![Output::new(Field::Variable(1), Field::Constant(followed_by), Field::Variable(0), Field::Constant(0))],
//! )
//! .unwrap();
//! eval.add_block(block).unwrap();
//!
//! let result = eval.commit(vec![Change::new(a, follows, b, 0, 1, 1, 1)]).unwrap();
//! assert_eq!(result.added().len(), 1);
//! assert_eq!(result.added()[0].entity, b);
//! ```

#![no_std]

extern crate alloc;

pub mod aggregate;
pub mod commit;
pub mod config;
pub mod evaluation;

pub use aggregate::{AggregateNode, AggregateUpdate, GroupAggregate};
pub use commit::CommitResult;
pub use config::EvaluationConfig;
pub use evaluation::Evaluation;

// Re-export commonly used types from dependencies
pub use tessera_core::{Change, Error, Id, Identity, Interner, RawValue, Result};
pub use tessera_incremental::{Aggregate, Average, Count, Delta, DistinctIndex, NumberBag, Sum};
pub use tessera_query::{
    Block, Comparison, Constraint, Derivation, FactStore, Field, NotScan, Output, Prefix, Scan, Transitions,
};
