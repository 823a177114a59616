//! Interception adapters.
//!
//! Hosts call these at their node-construction and node-type enumeration
//! call sites. Collaborator errors pass through untouched; the site filter
//! only ever looks at a successfully produced value.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};

use crate::policy::{explain, Decision, EvaluationContext, NodeTypeRules};

/// A constructed content node that knows its type.
pub trait TypedNode {
    type NodeType: NodeTypeRules + ?Sized;

    fn node_type(&self) -> &Self::NodeType;
}

/// Node-type name -> definition, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for NodeTypeMap<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> NodeTypeMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Keep entries for which `keep` returns true, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &T) -> bool) {
        self.entries.retain(|(k, v)| keep(k, v));
    }
}

impl<T> FromIterator<(String, T)> for NodeTypeMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<T> IntoIterator for NodeTypeMap<T> {
    type Item = (String, T);
    type IntoIter = std::vec::IntoIter<(String, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NodeTypeMap<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for MapVisitor<T> {
            type Value = NodeTypeMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of node type name to node type")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<NodeTypeMap<T>, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut out = NodeTypeMap::new();
                while let Some((name, value)) = access.next_entry::<String, T>()? {
                    if out.contains(&name) {
                        return Err(de::Error::custom(format!("duplicate node type: {name}")));
                    }
                    out.entries.push((name, value));
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(MapVisitor(PhantomData))
    }
}

/// Build a node through `construct`, then hide it if its type is not
/// allowed in `ctx`. An allowed node is returned as-is.
pub fn filter_constructed_node<N, E, F>(construct: F, ctx: &EvaluationContext) -> Result<Option<N>, E>
where
    N: TypedNode,
    F: FnOnce() -> Result<N, E>,
{
    filter_constructed_node_with(construct, ctx, |_| {})
}

/// Same as [`filter_constructed_node`]; `observe` sees the decision made
/// for a successfully constructed node.
pub fn filter_constructed_node_with<N, E, F, O>(
    construct: F,
    ctx: &EvaluationContext,
    observe: O,
) -> Result<Option<N>, E>
where
    N: TypedNode,
    F: FnOnce() -> Result<N, E>,
    O: FnOnce(Decision),
{
    let node = construct()?;
    let decision = explain(node.node_type(), ctx);
    observe(decision);
    if !decision.is_allowed() {
        tracing::debug!(
            site = ctx.current_site().unwrap_or("-"),
            reason = decision.as_str(),
            "constructed node suppressed"
        );
        return Ok(None);
    }
    Ok(Some(node))
}

/// Enumerate node types through `enumerate`, then drop every type that is
/// not allowed in `ctx`.
pub fn filter_node_type_map<T, E, F>(enumerate: F, ctx: &EvaluationContext) -> Result<NodeTypeMap<T>, E>
where
    T: NodeTypeRules,
    F: FnOnce() -> Result<NodeTypeMap<T>, E>,
{
    filter_node_type_map_with(enumerate, ctx, |_, _| {})
}

/// Same as [`filter_node_type_map`]; `observe` sees every entry's decision.
pub fn filter_node_type_map_with<T, E, F, O>(
    enumerate: F,
    ctx: &EvaluationContext,
    observe: O,
) -> Result<NodeTypeMap<T>, E>
where
    T: NodeTypeRules,
    F: FnOnce() -> Result<NodeTypeMap<T>, E>,
    O: FnMut(&str, Decision),
{
    let mut map = enumerate()?;
    retain_allowed_with(&mut map, ctx, observe);
    Ok(map)
}

/// Drop disallowed entries in place. Returns how many were removed.
pub fn retain_allowed<T: NodeTypeRules>(map: &mut NodeTypeMap<T>, ctx: &EvaluationContext) -> usize {
    retain_allowed_with(map, ctx, |_, _| {})
}

/// Drop disallowed entries in place, reporting each decision to `observe`.
/// Every entry is evaluated exactly once.
pub fn retain_allowed_with<T, O>(map: &mut NodeTypeMap<T>, ctx: &EvaluationContext, mut observe: O) -> usize
where
    T: NodeTypeRules,
    O: FnMut(&str, Decision),
{
    let before = map.len();
    map.retain(|name, ty| {
        let decision = explain(ty, ctx);
        observe(name, decision);
        if !decision.is_allowed() {
            tracing::debug!(
                node_type = name,
                site = ctx.current_site().unwrap_or("-"),
                reason = decision.as_str(),
                "node type hidden"
            );
        }
        decision.is_allowed()
    });
    before - map.len()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::cell::Cell;

    use super::*;
    use crate::policy::RuleSet;

    #[derive(Debug, PartialEq)]
    struct Ty {
        rules: RuleSet,
    }

    impl NodeTypeRules for Ty {
        fn is_abstract(&self) -> bool {
            false
        }
        fn rule_set(&self) -> Option<&RuleSet> {
            Some(&self.rules)
        }
    }

    fn ty(entries: &[(&str, bool)]) -> Ty {
        Ty {
            rules: RuleSet::from_entries(entries.iter().copied()).unwrap(),
        }
    }

    struct Node<'a> {
        ty: &'a Ty,
        path: String,
    }

    impl TypedNode for Node<'_> {
        type NodeType = Ty;
        fn node_type(&self) -> &Ty {
            self.ty
        }
    }

    fn at(site: &str) -> EvaluationContext {
        EvaluationContext::http(Some(site.into()))
    }

    #[test]
    fn listing_filter_keeps_survivor_order() {
        let map: NodeTypeMap<Ty> = vec![
            ("A:One".to_string(), ty(&[])),
            ("A:Two".to_string(), ty(&[("*", false)])),
            ("A:Three".to_string(), ty(&[("site", true), ("*", false)])),
            ("A:Four".to_string(), ty(&[("site", false)])),
            ("A:Five".to_string(), ty(&[("other", false)])),
        ]
        .into_iter()
        .collect();

        let out = filter_node_type_map(|| Ok::<_, String>(map), &at("site")).unwrap();
        assert_eq!(out.names().collect::<Vec<_>>(), ["A:One", "A:Three", "A:Five"]);
    }

    #[test]
    fn listing_filter_propagates_errors() {
        let err = filter_node_type_map::<Ty, _, _>(|| Err("registry down"), &at("site")).unwrap_err();
        assert_eq!(err, "registry down");
    }

    #[test]
    fn listing_filter_is_noop_outside_http() {
        let mut map = NodeTypeMap::new();
        map.insert("A:Two", ty(&[("*", false)]));
        assert_eq!(retain_allowed(&mut map, &EvaluationContext::background()), 0);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn construction_filter_suppresses_denied_node() {
        let denied = ty(&[("*", false)]);
        let calls = Cell::new(0);
        let out = filter_constructed_node(
            || {
                calls.set(calls.get() + 1);
                Ok::<_, String>(Node {
                    ty: &denied,
                    path: "/sites/a/chapter".into(),
                })
            },
            &at("site"),
        )
        .unwrap();
        assert!(out.is_none());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn construction_filter_returns_same_node() {
        let allowed = ty(&[("site", true)]);
        let out = filter_constructed_node(
            || {
                Ok::<_, String>(Node {
                    ty: &allowed,
                    path: "/sites/a/chapter".into(),
                })
            },
            &at("site"),
        )
        .unwrap()
        .unwrap();
        assert!(std::ptr::eq(out.ty, &allowed));
        assert_eq!(out.path, "/sites/a/chapter");
    }

    #[test]
    fn construction_filter_propagates_errors() {
        let out = filter_constructed_node::<Node<'_>, _, _>(|| Err(42u8), &at("site"));
        assert_eq!(out.err(), Some(42));
    }

    #[test]
    fn observers_see_each_decision_once() {
        let map: NodeTypeMap<Ty> = vec![
            ("A:One".to_string(), ty(&[])),
            ("A:Two".to_string(), ty(&[("*", false)])),
            ("A:Three".to_string(), ty(&[("site", false)])),
        ]
        .into_iter()
        .collect();

        let mut seen = Vec::new();
        let out = filter_node_type_map_with(
            || Ok::<_, String>(map),
            &at("site"),
            |name, d| seen.push((name.to_string(), d)),
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(
            seen,
            vec![
                ("A:One".to_string(), Decision::Unrestricted),
                ("A:Two".to_string(), Decision::WildcardDenied),
                ("A:Three".to_string(), Decision::SiteDenied),
            ]
        );

        let denied = ty(&[("*", false)]);
        let calls = Cell::new(0);
        let out = filter_constructed_node_with(
            || Ok::<_, String>(Node { ty: &denied, path: "/a".into() }),
            &at("site"),
            |d| {
                calls.set(calls.get() + 1);
                assert_eq!(d, Decision::WildcardDenied);
            },
        )
        .unwrap();
        assert!(out.is_none());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn constructed_observer_skipped_on_error() {
        let calls = Cell::new(0);
        let out = filter_constructed_node_with::<Node<'_>, _, _, _>(
            || Err("boom"),
            &at("site"),
            |_| calls.set(calls.get() + 1),
        );
        assert_eq!(out.err(), Some("boom"));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn deserialize_keeps_order_and_rejects_duplicates() {
        let map: NodeTypeMap<u32> = serde_yaml::from_str("z: 1\na: 2\nm: 3\n").unwrap();
        assert_eq!(map.names().collect::<Vec<_>>(), ["z", "a", "m"]);
        assert_eq!(map.get("a"), Some(&2));

        let err = serde_yaml::from_str::<NodeTypeMap<u32>>("a: 1\nb: 2\na: 3\n").unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{err}");
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = NodeTypeMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.insert("a", 3), Some(1));
        assert_eq!(map.into_iter().collect::<Vec<_>>(), vec![("a".to_string(), 3), ("b".to_string(), 2)]);
    }
}
