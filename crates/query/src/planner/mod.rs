//! Query planner module.

mod block;

pub use block::{Block, Output};
