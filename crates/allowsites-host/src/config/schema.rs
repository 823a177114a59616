use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;

use serde::Deserialize;

use allowsites_core::error::{AllowSitesError, Result};
use allowsites_core::policy::{RuleSet, ScopeId};
use allowsites_core::NodeTypeMap;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub sites: Vec<SiteConfig>,

    #[serde(default)]
    pub node_types: NodeTypeConfigs,
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AllowSitesError::UnsupportedVersion);
        }
        if self.sites.is_empty() {
            return Err(AllowSitesError::InvalidConfig("sites must not be empty".into()));
        }

        self.server.validate()?;

        let mut keys = HashSet::new();
        let mut domains = HashSet::new();
        for site in &self.sites {
            site.validate()?;
            if !keys.insert(site.key.as_str()) {
                return Err(AllowSitesError::InvalidConfig(format!(
                    "duplicate site key: {}",
                    site.key
                )));
            }
            for d in &site.domains {
                if !domains.insert(d.to_ascii_lowercase()) {
                    return Err(AllowSitesError::InvalidConfig(format!(
                        "domain {d} is assigned to more than one site"
                    )));
                }
            }
        }

        for (name, ty) in self.node_types.iter() {
            for sup in &ty.super_types {
                if !self.node_types.contains(sup) {
                    return Err(AllowSitesError::InvalidConfig(format!(
                        "node type {name} declares unknown super type {sup}"
                    )));
                }
            }
            if let Some(rules) = &ty.allowed_sites {
                for key in rules.site_keys() {
                    if !keys.contains(key) {
                        tracing::warn!(node_type = %name, site = %key, "allowed_sites refers to undeclared site");
                    }
                }
            }
        }
        check_super_type_cycles(&self.node_types)?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen.parse::<SocketAddr>().map_err(|_| {
            AllowSitesError::InvalidConfig(format!(
                "server.listen must be a valid socket address: {}",
                self.listen
            ))
        })?;
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Site package key, e.g. `Neos.Demo`.
    pub key: String,
    #[serde(default = "default_online")]
    pub online: bool,
    #[serde(default)]
    pub domains: Vec<String>,
}

impl SiteConfig {
    fn validate(&self) -> Result<()> {
        match ScopeId::parse(&self.key) {
            Ok(ScopeId::Site(_)) => {}
            _ => {
                return Err(AllowSitesError::InvalidConfig(format!(
                    "invalid site key: {:?}",
                    self.key
                )))
            }
        }
        for d in &self.domains {
            if d.is_empty() || d.contains(|c: char| c.is_whitespace() || c == '/') {
                return Err(AllowSitesError::InvalidConfig(format!(
                    "invalid domain for site {}: {d:?}",
                    self.key
                )));
            }
        }
        Ok(())
    }
}

fn default_online() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeTypeConfig {
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub super_types: Vec<String>,
    #[serde(default)]
    pub allowed_sites: Option<RuleSet>,
}

/// Node type declarations in file order.
pub type NodeTypeConfigs = NodeTypeMap<NodeTypeConfig>;

/// Fails if following `super_types` from any node type leads back to it.
fn check_super_type_cycles(types: &NodeTypeConfigs) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        types: &'a NodeTypeConfigs,
        name: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                path.push(name);
                return Err(AllowSitesError::InvalidConfig(format!(
                    "super type cycle: {}",
                    path.join(" -> ")
                )));
            }
            None => {}
        }
        marks.insert(name, Mark::Visiting);
        path.push(name);
        if let Some(ty) = types.get(name) {
            for sup in &ty.super_types {
                visit(types, sup, marks, path)?;
            }
        }
        path.pop();
        marks.insert(name, Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    for name in types.names() {
        visit(types, name, &mut marks, &mut Vec::new())?;
    }
    Ok(())
}
