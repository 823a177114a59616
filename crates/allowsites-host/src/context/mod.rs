//! Request context handed from the HTTP layer to site resolution.
//!
//! Replaces "ask the bootstrap which request handler is active" with an
//! explicit value.

/// How the current unit of work reached the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestContext {
    /// Served HTTP request, with its `Host` header if present.
    Http { host: Option<String> },
    /// CLI, background jobs, maintenance.
    Background,
}

impl RequestContext {
    pub fn http(host: impl Into<String>) -> Self {
        RequestContext::Http {
            host: Some(host.into()),
        }
    }
}
