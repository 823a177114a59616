//! Site policy: typed rule sets and the evaluator that applies them.

pub mod evaluator;
pub mod rules;

pub use evaluator::{evaluate, evaluate_rules, explain, Decision, EvaluationContext, NodeTypeRules};
pub use rules::{RuleSet, ScopeId, SiteRule, WILDCARD};
