//! Sites, their domains, and per-request site resolution.

pub mod repository;
pub mod resolver;

pub use repository::{DomainRepository, InMemorySites, SiteRepository};
pub use resolver::SiteResolver;

/// A site served by this platform instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub key: String,
    pub online: bool,
    pub domains: Vec<String>,
}

/// Lowercase a `Host` header value and strip its port.
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    let host = if let Some(rest) = raw.strip_prefix('[') {
        // [v6]:port
        rest.split(']').next().unwrap_or(rest)
    } else if raw.matches(':').count() > 1 {
        // bare v6 literal; a port requires brackets
        raw
    } else {
        match raw.rsplit_once(':') {
            Some((h, port)) if port.chars().all(|c| c.is_ascii_digit()) => h,
            _ => raw,
        }
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}
