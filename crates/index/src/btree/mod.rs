//! Arena-allocated B-tree with cached subtree bounds.

mod iter;
mod node;
mod tree;

pub use iter::Iter;
pub use node::{Node, NodeId};
pub use tree::{OrderedIndex, DEFAULT_MIN_KEYS};
