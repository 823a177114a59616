use std::sync::Arc;

use allowsites_core::error::{AllowSitesError, Result};
use allowsites_core::TypedNode;

use crate::registry::{NodeType, NodeTypeSource};

/// A content node placed in the tree.
#[derive(Debug, Clone)]
pub struct Node {
    path: String,
    node_type: Arc<NodeType>,
}

impl Node {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn node_type_name(&self) -> &str {
        self.node_type.name()
    }
}

impl TypedNode for Node {
    type NodeType = NodeType;

    fn node_type(&self) -> &NodeType {
        &self.node_type
    }
}

/// Builds nodes from a node type source. Knows nothing about sites.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeFactory;

impl NodeFactory {
    pub fn create(&self, source: &dyn NodeTypeSource, node_type: &str, path: &str) -> Result<Node> {
        if !path.starts_with('/') || path.ends_with('/') || path.contains("//") {
            return Err(AllowSitesError::BadRequest(format!("invalid node path: {path:?}")));
        }
        let node_type = source.node_type(node_type)?;
        Ok(Node {
            path: path.to_string(),
            node_type,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::NodeTypeConfigs;
    use crate::registry::NodeTypeRegistry;

    fn registry() -> NodeTypeRegistry {
        let cfg: NodeTypeConfigs = serde_yaml::from_str("\"Demo:Text\": {}\n").unwrap();
        NodeTypeRegistry::from_config(&cfg).unwrap()
    }

    #[test]
    fn creates_node() {
        let node = NodeFactory.create(&registry(), "Demo:Text", "/sites/demo/intro").unwrap();
        assert_eq!(node.name(), "intro");
        assert_eq!(node.node_type_name(), "Demo:Text");
    }

    #[test]
    fn rejects_bad_paths_and_types() {
        let reg = registry();
        for bad in ["", "relative", "/trailing/", "/a//b"] {
            let err = NodeFactory.create(&reg, "Demo:Text", bad).unwrap_err();
            assert_eq!(err.code().as_str(), "BAD_REQUEST", "{bad}");
        }
        let err = NodeFactory.create(&reg, "Demo:Missing", "/a").unwrap_err();
        assert_eq!(err.code().as_str(), "UNKNOWN_NODE_TYPE");
    }
}
