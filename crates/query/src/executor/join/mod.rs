//! JOIN algorithm implementations.

mod generic;

pub use generic::{Derivation, GenericJoin};
