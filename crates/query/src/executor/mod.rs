//! Query executor module.

mod constraint;
pub mod join;
mod scan;

pub use constraint::{Comparison, Constraint, NotScan};
pub use join::{Derivation, GenericJoin};
pub use scan::{ApplyInput, Field, Scan};
