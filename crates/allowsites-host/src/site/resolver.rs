use std::sync::Arc;

use allowsites_core::error::Result;
use allowsites_core::policy::EvaluationContext;

use super::{DomainRepository, Site, SiteRepository};
use crate::context::RequestContext;

/// Resolves the site serving a request.
#[derive(Clone)]
pub struct SiteResolver {
    domains: Arc<dyn DomainRepository>,
    sites: Arc<dyn SiteRepository>,
}

impl SiteResolver {
    pub fn new(domains: Arc<dyn DomainRepository>, sites: Arc<dyn SiteRepository>) -> Self {
        Self { domains, sites }
    }

    /// The site owning `host`; otherwise the first online site.
    pub async fn current_site(&self, host: Option<&str>) -> Result<Option<Arc<Site>>> {
        if let Some(host) = host {
            if let Some(site) = self.domains.find_by_host(host).await? {
                return Ok(Some(site));
            }
        }
        let fallback = self.sites.find_first_online().await?;
        if fallback.is_none() {
            tracing::debug!(host = host.unwrap_or("-"), "no site resolved");
        }
        Ok(fallback)
    }

    /// Build the evaluation context for `req`. Background work skips the
    /// site lookups entirely.
    pub async fn evaluation_context(&self, req: &RequestContext) -> Result<EvaluationContext> {
        match req {
            RequestContext::Background => Ok(EvaluationContext::background()),
            RequestContext::Http { host } => {
                let site = self.current_site(host.as_deref()).await?;
                Ok(EvaluationContext::http(site.map(|s| s.key.clone())))
            }
        }
    }
}
