//! allowsites host library.
//!
//! Wires configuration, the node type registry, site resolution and the
//! site-filtered content view into an HTTP service. Consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod content;
pub mod context;
pub mod obs;
pub mod registry;
pub mod router;
pub mod site;
pub mod transport;
