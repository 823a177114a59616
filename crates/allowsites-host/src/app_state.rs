//! Shared application state for the allowsites host.

use std::sync::Arc;

use allowsites_core::error::Result;

use crate::config::HostConfig;
use crate::content::SiteFilteredContent;
use crate::obs::metrics::HostMetrics;
use crate::registry::NodeTypeRegistry;
use crate::site::{InMemorySites, SiteResolver};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    sites: Arc<InMemorySites>,
    resolver: SiteResolver,
    content: SiteFilteredContent,
    metrics: Arc<HostMetrics>,
}

impl AppState {
    /// Compile the node type registry and site repository from `cfg`.
    pub fn new(cfg: HostConfig) -> Result<Self> {
        let registry = Arc::new(NodeTypeRegistry::from_config(&cfg.node_types)?);
        let sites = Arc::new(InMemorySites::from_config(&cfg.sites));
        let metrics = Arc::new(HostMetrics::default());

        let resolver = SiteResolver::new(sites.clone(), sites.clone());
        let content = SiteFilteredContent::new(registry.clone(), metrics.clone());

        tracing::info!(
            sites = sites.keys().len(),
            node_types = registry.len(),
            "allowsites state ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                sites,
                resolver,
                content,
                metrics,
            }),
        })
    }

    pub fn sites(&self) -> Arc<InMemorySites> {
        Arc::clone(&self.inner.sites)
    }

    pub fn resolver(&self) -> &SiteResolver {
        &self.inner.resolver
    }

    pub fn content(&self) -> &SiteFilteredContent {
        &self.inner.content
    }

    pub fn metrics(&self) -> &HostMetrics {
        &self.inner.metrics
    }
}
