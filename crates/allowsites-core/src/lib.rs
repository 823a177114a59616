//! allowsites core: per-site node-type policy evaluation.
//!
//! Decides whether a node type may be used on the site serving the current
//! request, and applies that decision to constructed nodes and node-type
//! listings. The crate performs no I/O: the host resolves the request
//! context and owns the node-type registry.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Evaluation never
//! fails; only rule-set construction returns errors.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod filter;
pub mod policy;

pub use error::{AllowSitesError, ErrorCode, Result};
pub use filter::{
    filter_constructed_node, filter_constructed_node_with, filter_node_type_map, filter_node_type_map_with,
    NodeTypeMap, TypedNode,
};
pub use policy::{evaluate, explain, Decision, EvaluationContext, NodeTypeRules, RuleSet, ScopeId};
