//! Typed per-node-type site rules.
//!
//! A rule set is the ordered `{ scope: allowed }` mapping declared under a
//! node type's `allowed_sites`. Scope ids are validated once when the rule
//! set is built; evaluation never re-parses them.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};

use crate::error::{AllowSitesError, Result};

/// Reserved scope id meaning "every site".
pub const WILDCARD: &str = "*";

/// Rule key: a concrete site key or the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeId {
    Wildcard,
    Site(String),
}

impl ScopeId {
    /// Parse a raw scope id.
    ///
    /// Site keys are package-style identifiers (`Vendor.Site`, `acme-shop`,
    /// `Neos.Demo:Main`): ASCII letters, digits, `.`, `_`, `-` and `:`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw == WILDCARD {
            return Ok(ScopeId::Wildcard);
        }
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ':'));
        if !valid {
            return Err(AllowSitesError::InvalidScope(raw.to_string()));
        }
        Ok(ScopeId::Site(raw.to_string()))
    }

    /// Site key for concrete scopes.
    pub fn site(&self) -> Option<&str> {
        match self {
            ScopeId::Wildcard => None,
            ScopeId::Site(s) => Some(s),
        }
    }

    /// True only for a concrete scope naming exactly `site`.
    pub fn is_site(&self, site: &str) -> bool {
        self.site() == Some(site)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeId::Wildcard => f.write_str(WILDCARD),
            ScopeId::Site(s) => f.write_str(s),
        }
    }
}

/// One `(scope, allowed)` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRule {
    pub scope: ScopeId,
    pub allowed: bool,
}

/// Ordered site rules of one node type. Declaration order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<SiteRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(scope, allowed)` pairs, keeping their order.
    /// Fails on malformed or repeated scope ids.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let mut out = Self::new();
        for (raw, allowed) in entries {
            let scope = ScopeId::parse(raw.as_ref())?;
            if out.get(&scope).is_some() {
                return Err(AllowSitesError::DuplicateScope(scope.to_string()));
            }
            out.rules.push(SiteRule { scope, allowed });
        }
        Ok(out)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SiteRule> {
        self.rules.iter()
    }

    /// Flag declared for `scope`, if any.
    pub fn get(&self, scope: &ScopeId) -> Option<bool> {
        self.rules.iter().find(|r| &r.scope == scope).map(|r| r.allowed)
    }

    /// Concrete site keys referenced by this rule set.
    pub fn site_keys(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().filter_map(|r| r.scope.site())
    }

    /// Merge `over` on top of `self`.
    ///
    /// Scopes already present keep their position and take the flag from
    /// `over`; new scopes are appended in `over`'s order.
    pub fn overlay(&self, over: &RuleSet) -> RuleSet {
        let mut rules = self.rules.clone();
        for r in &over.rules {
            match rules.iter_mut().find(|e| e.scope == r.scope) {
                Some(existing) => existing.allowed = r.allowed,
                None => rules.push(r.clone()),
            }
        }
        RuleSet { rules }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a SiteRule;
    type IntoIter = std::slice::Iter<'a, SiteRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RuleSetVisitor;

        impl<'de> Visitor<'de> for RuleSetVisitor {
            type Value = RuleSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of site key (or \"*\") to bool")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<RuleSet, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, bool)> = Vec::new();
                while let Some((k, v)) = map.next_entry::<String, bool>()? {
                    entries.push((k, v));
                }
                RuleSet::from_entries(entries).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_map(RuleSetVisitor)
    }
}
