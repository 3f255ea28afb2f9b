//! Tessera Core - Core types for the Tessera evaluation engine.
//!
//! This crate provides the foundational types shared by every other crate:
//!
//! - `RawValue`: The external values (numbers and strings) facts are built from
//! - `Interner`: Reference-counted mapping between raw values and compact `Id`s
//! - `Identity`: The (entity, attribute, value, context) quadruple a fact is about
//! - `Change`: An identity observed at a transaction/round with a signed count
//! - `Error`: Error types for plan validation and id resolution
//!
//! # Example
//!
//! ```rust
//! use tessera_core::{Change, Interner, RawValue};
//!
//! let mut interner = Interner::new();
//! let e1 = interner.intern_str("e1");
//! let tag = interner.intern_str("tag");
//! let person = interner.intern_str("person");
//! let ctx = interner.intern_str("session");
//!
//! let change = Change::new(e1, tag, person, ctx, 1, 1, 1);
//! assert!(change.is_insert());
//! assert_eq!(interner.reverse(change.value), &RawValue::from("person"));
//! ```

#![no_std]

extern crate alloc;

mod change;
mod error;
mod interner;
mod value;

pub use change::{Change, Identity, Multiplicity, Round, TransactionId};
pub use error::{Error, Result};
pub use interner::{Id, Interner};
pub use value::RawValue;
