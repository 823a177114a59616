use std::sync::Arc;

use super::rules::{RuleSet, ScopeId};

/// What the evaluator needs to know about a node type.
pub trait NodeTypeRules {
    fn is_abstract(&self) -> bool;
    /// Effective site rules; `None` when the type declares none.
    fn rule_set(&self) -> Option<&RuleSet>;
}

impl<T: NodeTypeRules + ?Sized> NodeTypeRules for &T {
    fn is_abstract(&self) -> bool {
        (**self).is_abstract()
    }
    fn rule_set(&self) -> Option<&RuleSet> {
        (**self).rule_set()
    }
}

impl<T: NodeTypeRules + ?Sized> NodeTypeRules for Arc<T> {
    fn is_abstract(&self) -> bool {
        (**self).is_abstract()
    }
    fn rule_set(&self) -> Option<&RuleSet> {
        (**self).rule_set()
    }
}

/// Per-call facts about the request being served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationContext {
    /// False for CLI, background and maintenance work.
    pub is_http_request: bool,
    /// Resolved site key, already including the first-online fallback.
    pub current_site: Option<String>,
}

impl EvaluationContext {
    pub fn http(current_site: Option<String>) -> Self {
        Self {
            is_http_request: true,
            current_site,
        }
    }

    pub fn background() -> Self {
        Self::default()
    }

    pub fn current_site(&self) -> Option<&str> {
        self.current_site.as_deref()
    }
}

/// Evaluation outcome together with the step that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    OutsideHttpRequest,
    AbstractType,
    Unrestricted,
    NoSiteResolved,
    SiteAllowed,
    WildcardAllowed,
    SiteDenied,
    WildcardDenied,
    NoMatchingRule,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        !matches!(self, Decision::SiteDenied | Decision::WildcardDenied)
    }

    /// Stable label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::OutsideHttpRequest => "outside_http_request",
            Decision::AbstractType => "abstract_type",
            Decision::Unrestricted => "unrestricted",
            Decision::NoSiteResolved => "no_site_resolved",
            Decision::SiteAllowed => "site_allowed",
            Decision::WildcardAllowed => "wildcard_allowed",
            Decision::SiteDenied => "site_denied",
            Decision::WildcardDenied => "wildcard_denied",
            Decision::NoMatchingRule => "no_matching_rule",
        }
    }
}

/// Decide whether `node_type` is usable in `ctx`, with the reason.
pub fn explain<T>(node_type: &T, ctx: &EvaluationContext) -> Decision
where
    T: NodeTypeRules + ?Sized,
{
    if !ctx.is_http_request {
        return Decision::OutsideHttpRequest;
    }
    if node_type.is_abstract() {
        return Decision::AbstractType;
    }
    let rules = match node_type.rule_set() {
        Some(rules) if !rules.is_empty() => rules,
        _ => return Decision::Unrestricted,
    };
    match ctx.current_site() {
        Some(site) => evaluate_rules(rules, site),
        None => Decision::NoSiteResolved,
    }
}

/// Decide whether `node_type` is usable in `ctx`.
pub fn evaluate<T>(node_type: &T, ctx: &EvaluationContext) -> bool
where
    T: NodeTypeRules + ?Sized,
{
    explain(node_type, ctx).is_allowed()
}

/// Walk `rules` in declaration order for `site`.
///
/// The first allow matching the site or the wildcard wins, as does the first
/// deny naming the site. A wildcard deny only takes effect if the walk ends
/// without either.
pub fn evaluate_rules(rules: &RuleSet, site: &str) -> Decision {
    let mut wildcard_denied = false;

    for rule in rules {
        match (&rule.scope, rule.allowed) {
            (ScopeId::Wildcard, true) => return Decision::WildcardAllowed,
            (scope, true) if scope.is_site(site) => return Decision::SiteAllowed,
            (scope, false) if scope.is_site(site) => return Decision::SiteDenied,
            (ScopeId::Wildcard, false) => wildcard_denied = true,
            // A wildcard allow already returned above, so nothing clears
            // `wildcard_denied` once set.
            _ => {}
        }
    }

    if wildcard_denied {
        Decision::WildcardDenied
    } else {
        Decision::NoMatchingRule
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    struct Ty {
        is_abstract: bool,
        rules: Option<RuleSet>,
    }

    impl NodeTypeRules for Ty {
        fn is_abstract(&self) -> bool {
            self.is_abstract
        }
        fn rule_set(&self) -> Option<&RuleSet> {
            self.rules.as_ref()
        }
    }

    fn ty(entries: &[(&str, bool)]) -> Ty {
        Ty {
            is_abstract: false,
            rules: Some(RuleSet::from_entries(entries.iter().copied()).unwrap()),
        }
    }

    fn at(site: &str) -> EvaluationContext {
        EvaluationContext::http(Some(site.to_string()))
    }

    fn rule_fixtures() -> Vec<Vec<(&'static str, bool)>> {
        vec![
            vec![("*", false)],
            vec![("siteA", false)],
            vec![("siteA", false), ("*", false)],
            vec![("siteB", true), ("*", false)],
        ]
    }

    #[test]
    fn background_context_always_allowed() {
        for rules in rule_fixtures() {
            let t = ty(&rules);
            assert_eq!(
                explain(&t, &EvaluationContext::background()),
                Decision::OutsideHttpRequest
            );
            let mut ctx = at("siteA");
            ctx.is_http_request = false;
            assert!(evaluate(&t, &ctx));
        }
    }

    #[test]
    fn abstract_types_always_allowed() {
        for rules in rule_fixtures() {
            let mut t = ty(&rules);
            t.is_abstract = true;
            assert_eq!(explain(&t, &at("siteA")), Decision::AbstractType);
        }
    }

    #[test]
    fn absent_or_empty_rules_allowed() {
        let absent = Ty {
            is_abstract: false,
            rules: None,
        };
        let empty = ty(&[]);
        assert_eq!(explain(&absent, &at("siteA")), Decision::Unrestricted);
        assert_eq!(explain(&empty, &at("siteA")), Decision::Unrestricted);
    }

    #[test]
    fn unresolved_site_allowed() {
        let t = ty(&[("*", false)]);
        assert_eq!(
            explain(&t, &EvaluationContext::http(None)),
            Decision::NoSiteResolved
        );
        assert!(evaluate(&t, &EvaluationContext::http(None)));
    }

    #[test]
    fn specific_allow_beats_later_wildcard_deny() {
        let t = ty(&[("siteA", true), ("*", false)]);
        assert_eq!(explain(&t, &at("siteA")), Decision::SiteAllowed);
        assert_eq!(explain(&t, &at("siteB")), Decision::WildcardDenied);
    }

    #[test]
    fn wildcard_deny_without_specific_rule() {
        let t = ty(&[("*", false)]);
        assert!(!evaluate(&t, &at("siteB")));
    }

    #[test]
    fn specific_deny_before_wildcard_allow() {
        let t = ty(&[("siteB", false), ("*", true)]);
        assert_eq!(explain(&t, &at("siteB")), Decision::SiteDenied);
        assert_eq!(explain(&t, &at("siteC")), Decision::WildcardAllowed);
    }

    #[test]
    fn wildcard_allow_before_specific_deny_wins() {
        let t = ty(&[("*", true), ("siteB", false)]);
        assert_eq!(explain(&t, &at("siteB")), Decision::WildcardAllowed);
        assert!(evaluate(&t, &at("siteB")));
    }

    #[test]
    fn specific_allow_after_wildcard_deny_overrides() {
        let t = ty(&[("*", false), ("siteA", true)]);
        assert_eq!(explain(&t, &at("siteA")), Decision::SiteAllowed);
    }

    #[test]
    fn rules_for_other_sites_only() {
        let t = ty(&[("siteA", false), ("siteB", true)]);
        assert_eq!(explain(&t, &at("siteC")), Decision::NoMatchingRule);
        assert!(evaluate(&t, &at("siteC")));
    }

    #[test]
    fn works_through_references_and_arcs() {
        let t = Arc::new(ty(&[("*", false)]));
        assert!(!evaluate(&t, &at("x")));
        assert!(!evaluate(&&*t, &at("x")));
    }
}
