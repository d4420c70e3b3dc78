//! Widget node arena: generational ids, parent/child edges, lifecycle, and
//! the layout entry points the sizers recurse through.

mod core;

pub use core::{Anchor, Behaviour, Node, NodeId, Tree};
