//! # Configuration Model
//!
//! The declarative resource tree: typed paths, nodes with validated
//! attribute slots, and the stored tree the management operations mutate.

pub mod node;
pub mod path;
pub mod tree;

pub use node::ConfigurationNode;
pub use path::{PathSegment, ResourceKind, ResourcePath};
pub use tree::ConfigurationTree;
