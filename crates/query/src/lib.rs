//! Tessera Query - Pattern matching and generic join for the Tessera evaluation engine.
//!
//! This crate evaluates conjunctive queries over interned facts:
//!
//! - `store`: The accumulated fact set with per-round presence, indexed three
//!   ways for prefix lookups
//! - `transitions`: Presence over rounds as signed steps
//! - `prefix`: Register bindings built up during a join
//! - `executor`: Scans (`Field`/`Scan`), comparison constraints, negated
//!   scans and the `GenericJoin` executor, with a batch mode and a
//!   maintenance mode that applies one presence step
//! - `planner`: Validated `Block`s pairing a join with the facts it derives
//!
//! # Example
//!
//! ```rust
//! use tessera_core::{Identity, Interner};
//! use tessera_query::{Block, FactStore, Field, Output, Prefix, Scan};
//!
//! const TAG: u32 = 10;
//! const PERSON: u32 = 11;
//! const NAME: u32 = 12;
//! const ADA: u32 = 13;
//!
//! let mut store = FactStore::new();
//! store.apply(&Identity::new(1, TAG, PERSON, 0), 1, 1);
//! store.apply(&Identity::new(1, NAME, ADA, 0), 1, 1);
//!
//! let block = Block::new(
//!     "people",
//!     vec![
//!         Scan::eav(Field::Variable(0), Field::Constant(TAG), Field::Constant(PERSON)),
//!         Scan::eav(Field::Variable(0), Field::Constant(NAME), Field::Variable(1)),
//!     ],
//!     vec![Output::new(Field::Variable(1), Field::Constant(TAG), Field::Constant(PERSON), Field::Constant(0))],
//! )
//! .unwrap();
//!
//! let results = block.exec(&store, &Interner::new());
//! assert_eq!(results, vec![Prefix::from_values([1, ADA])]);
//! assert_eq!(block.project(&results[0]).unwrap(), vec![Identity::new(ADA, TAG, PERSON, 0)]);
//! ```

#![no_std]

extern crate alloc;

pub mod executor;
pub mod planner;
pub mod prefix;
pub mod store;
pub mod transitions;

pub use executor::{ApplyInput, Comparison, Constraint, Derivation, Field, GenericJoin, NotScan, Scan};
pub use planner::{Block, Output};
pub use prefix::{Prefix, Register};
pub use store::{pattern_matches, FactStore, Pattern};
pub use transitions::Transitions;
