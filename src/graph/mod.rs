//! The resource graph: nodes for every distinct dotted path a request touches, with the
//! relationship resolution and field selection the compiler performs per node.

pub(crate) mod fields;
pub mod node;
pub mod reflection;
