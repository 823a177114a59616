//! HTTP handlers.

pub mod http;
