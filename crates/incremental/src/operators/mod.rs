//! Incremental operators.
//!
//! - Distinct: converts weighted observations into presence deltas
//! - Aggregate: incrementally maintains aggregate values per group

mod aggregate;
mod distinct;

pub use aggregate::{Aggregate, Average, Count, NumberBag, Sum};
pub use distinct::{DistinctHistory, DistinctIndex};
