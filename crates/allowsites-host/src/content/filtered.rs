use std::sync::Arc;

use allowsites_core::error::Result;
use allowsites_core::policy::EvaluationContext;
use allowsites_core::{filter_constructed_node_with, filter_node_type_map_with, NodeTypeMap};

use super::node::{Node, NodeFactory};
use crate::obs::metrics::HostMetrics;
use crate::registry::{NodeType, NodeTypeSource};

/// Node type source and node factory with the site policy applied at both
/// call sites.
#[derive(Clone)]
pub struct SiteFilteredContent {
    source: Arc<dyn NodeTypeSource>,
    factory: NodeFactory,
    metrics: Arc<HostMetrics>,
}

impl SiteFilteredContent {
    pub fn new(source: Arc<dyn NodeTypeSource>, metrics: Arc<HostMetrics>) -> Self {
        Self {
            source,
            factory: NodeFactory,
            metrics,
        }
    }

    /// Node types usable in `ctx`, in declaration order.
    pub fn node_types(&self, ctx: &EvaluationContext) -> Result<NodeTypeMap<Arc<NodeType>>> {
        filter_node_type_map_with(
            || self.source.node_types(),
            ctx,
            |_, decision| self.metrics.record_decision("listing", decision),
        )
    }

    /// Build a node at `path`. `None` if its type is not usable in `ctx`.
    pub fn create_node(&self, node_type: &str, path: &str, ctx: &EvaluationContext) -> Result<Option<Node>> {
        filter_constructed_node_with(
            || self.factory.create(self.source.as_ref(), node_type, path),
            ctx,
            |decision| self.metrics.record_decision("construct", decision),
        )
    }
}
