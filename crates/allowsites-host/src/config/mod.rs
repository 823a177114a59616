//! Host config loader (strict parsing).

pub mod schema;

use std::fs;

use allowsites_core::error::{AllowSitesError, Result};

pub use schema::{HostConfig, NodeTypeConfig, NodeTypeConfigs, ServerSection, SiteConfig};

pub fn load_from_file(path: &str) -> Result<HostConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| AllowSitesError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<HostConfig> {
    let cfg: HostConfig = serde_yaml::from_str(s)
        .map_err(|e| AllowSitesError::InvalidConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
