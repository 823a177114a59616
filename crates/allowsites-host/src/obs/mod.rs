//! In-process metrics for the host, rendered by the `/metrics` handler.

pub mod metrics;
