//! Content nodes and the site-filtered view over node types.

pub mod filtered;
pub mod node;

pub use filtered::SiteFilteredContent;
pub use node::{Node, NodeFactory};
