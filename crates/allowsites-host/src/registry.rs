//! Node type registry.
//!
//! Compiles node type declarations once at startup. Each type's effective
//! site rules are its supertypes' rules (declared order, depth first) with
//! its own rules laid on top.

use std::collections::HashMap;
use std::sync::Arc;

use allowsites_core::error::{AllowSitesError, Result};
use allowsites_core::policy::{NodeTypeRules, RuleSet};
use allowsites_core::NodeTypeMap;

use crate::config::NodeTypeConfigs;

/// Compiled node type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeType {
    name: String,
    is_abstract: bool,
    declared: Option<RuleSet>,
    effective: RuleSet,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rules declared on this type alone, before supertype propagation.
    pub fn declared_rules(&self) -> Option<&RuleSet> {
        self.declared.as_ref()
    }
}

impl NodeTypeRules for NodeType {
    fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    fn rule_set(&self) -> Option<&RuleSet> {
        if self.effective.is_empty() {
            None
        } else {
            Some(&self.effective)
        }
    }
}

/// Where node type definitions come from.
pub trait NodeTypeSource: Send + Sync {
    /// Every known node type, in declaration order.
    fn node_types(&self) -> Result<NodeTypeMap<Arc<NodeType>>>;

    fn node_type(&self, name: &str) -> Result<Arc<NodeType>>;
}

#[derive(Debug, Default)]
pub struct NodeTypeRegistry {
    types: NodeTypeMap<Arc<NodeType>>,
}

impl NodeTypeRegistry {
    pub fn from_config(cfg: &NodeTypeConfigs) -> Result<Self> {
        let mut resolved: HashMap<String, RuleSet> = HashMap::new();
        let mut types = NodeTypeMap::new();

        for (name, ty) in cfg.iter() {
            let mut stack = Vec::new();
            let effective = effective_rules(cfg, name, &mut resolved, &mut stack)?;
            types.insert(
                name,
                Arc::new(NodeType {
                    name: name.to_string(),
                    is_abstract: ty.is_abstract,
                    declared: ty.allowed_sites.clone(),
                    effective,
                }),
            );
        }

        tracing::debug!(count = types.len(), "node type registry compiled");
        Ok(Self { types })
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl NodeTypeSource for NodeTypeRegistry {
    fn node_types(&self) -> Result<NodeTypeMap<Arc<NodeType>>> {
        Ok(self.types.clone())
    }

    fn node_type(&self, name: &str) -> Result<Arc<NodeType>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| AllowSitesError::UnknownNodeType(name.to_string()))
    }
}

fn effective_rules(
    cfg: &NodeTypeConfigs,
    name: &str,
    resolved: &mut HashMap<String, RuleSet>,
    stack: &mut Vec<String>,
) -> Result<RuleSet> {
    if let Some(done) = resolved.get(name) {
        return Ok(done.clone());
    }
    if stack.iter().any(|s| s == name) {
        stack.push(name.to_string());
        return Err(AllowSitesError::InvalidConfig(format!(
            "super type cycle: {}",
            stack.join(" -> ")
        )));
    }
    let ty = cfg
        .get(name)
        .ok_or_else(|| AllowSitesError::UnknownNodeType(name.to_string()))?;

    stack.push(name.to_string());
    let mut acc = RuleSet::new();
    for sup in &ty.super_types {
        let inherited = effective_rules(cfg, sup, resolved, stack)?;
        acc = acc.overlay(&inherited);
    }
    if let Some(own) = &ty.allowed_sites {
        acc = acc.overlay(own);
    }
    stack.pop();

    resolved.insert(name.to_string(), acc.clone());
    Ok(acc)
}
