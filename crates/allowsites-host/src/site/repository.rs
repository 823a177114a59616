use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use allowsites_core::error::{AllowSitesError, Result};

use super::{normalize_host, Site};
use crate::config::SiteConfig;

/// Maps request hosts to sites.
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// Site owning `host`, if any domain matches.
    async fn find_by_host(&self, host: &str) -> Result<Option<Arc<Site>>>;
}

/// Site lookups independent of the request.
#[async_trait]
pub trait SiteRepository: Send + Sync {
    /// First site marked online, in declaration order.
    async fn find_first_online(&self) -> Result<Option<Arc<Site>>>;
}

/// Config-backed site and domain repository.
///
/// Online state can be flipped at runtime; everything else is fixed at load.
#[derive(Debug, Default)]
pub struct InMemorySites {
    order: Vec<String>,
    sites: DashMap<String, Arc<Site>>,
    domains: DashMap<String, String>,
}

impl InMemorySites {
    pub fn from_config(sites: &[SiteConfig]) -> Self {
        let out = Self::default();
        let mut order = Vec::with_capacity(sites.len());
        for s in sites {
            let site = Site {
                key: s.key.clone(),
                online: s.online,
                domains: s.domains.iter().map(|d| normalize_host(d)).collect(),
            };
            for d in &site.domains {
                out.domains.insert(d.clone(), site.key.clone());
            }
            order.push(site.key.clone());
            out.sites.insert(site.key.clone(), Arc::new(site));
        }
        Self { order, ..out }
    }

    /// Mark a site online or offline.
    pub fn set_online(&self, key: &str, online: bool) -> Result<()> {
        let mut entry = self
            .sites
            .get_mut(key)
            .ok_or_else(|| AllowSitesError::UnknownSite(key.to_string()))?;
        let mut site = (**entry).clone();
        site.online = online;
        *entry = Arc::new(site);
        tracing::info!(site = %key, online, "site online state changed");
        Ok(())
    }

    pub fn keys(&self) -> &[String] {
        &self.order
    }
}

#[async_trait]
impl DomainRepository for InMemorySites {
    async fn find_by_host(&self, host: &str) -> Result<Option<Arc<Site>>> {
        let host = normalize_host(host);
        let Some(key) = self.domains.get(&host).map(|k| k.value().clone()) else {
            return Ok(None);
        };
        Ok(self.sites.get(&key).map(|s| Arc::clone(s.value())))
    }
}

#[async_trait]
impl SiteRepository for InMemorySites {
    async fn find_first_online(&self) -> Result<Option<Arc<Site>>> {
        for key in &self.order {
            if let Some(site) = self.sites.get(key) {
                if site.online {
                    return Ok(Some(Arc::clone(site.value())));
                }
            }
        }
        Ok(None)
    }
}
