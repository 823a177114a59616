//! Policy decision vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use serde::Deserialize;

use allowsites_core::{evaluate, explain, EvaluationContext, NodeTypeRules, RuleSet};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DecisionVector {
    description: String,
    #[serde(default)]
    rules: Option<RuleSet>,
    #[serde(default)]
    site: Option<String>,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default = "default_http")]
    http: bool,
    expect: String,
}

fn default_http() -> bool {
    true
}

impl NodeTypeRules for DecisionVector {
    fn is_abstract(&self) -> bool {
        self.is_abstract
    }
    fn rule_set(&self) -> Option<&RuleSet> {
        self.rules.as_ref()
    }
}

fn load(name: &str) -> Vec<DecisionVector> {
    let path = format!("{}/tests/vectors/{name}", env!("CARGO_MANIFEST_DIR"));
    let s = fs::read_to_string(path).unwrap();
    serde_yaml::from_str(&s).expect("invalid vector file")
}

#[test]
fn decision_vectors() {
    let vectors = load("decisions.yaml");
    assert!(!vectors.is_empty());

    for v in &vectors {
        let ctx = EvaluationContext {
            is_http_request: v.http,
            current_site: v.site.clone(),
        };
        let decision = explain(v, &ctx);
        assert_eq!(decision.as_str(), v.expect, "{}", v.description);
        assert_eq!(evaluate(v, &ctx), decision.is_allowed(), "{}", v.description);
    }
}
