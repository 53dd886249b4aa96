//! Rule evaluation. Each [`RuleLogic`] variant has a dedicated evaluator;
//! dispatch happens over the tagged enum, never over strings. A rule whose
//! preconditions do not hold returns `None` and is omitted from the trace —
//! "not applicable" is distinct from "applicable and failed".

mod comparison;
mod documents;
mod placeholder;
mod preconditions;
mod variance;

use std::collections::BTreeSet;

use verdict_core::models::{Baseline, BaselineSource, RuleTrace};
use verdict_core::policy::{Rule, RuleLogic};

pub use preconditions::preconditions_hold;

/// Immutable inputs shared by every rule evaluator for one group.
pub struct RuleContext<'a> {
    pub po_price: Option<f64>,
    pub baseline: Option<&'a Baseline>,
    pub baseline_source: Option<&'a BaselineSource>,
    pub artifacts_present: &'a BTreeSet<String>,
}

impl RuleContext<'_> {
    pub fn baseline_available(&self) -> bool {
        self.baseline.is_some()
    }
}

/// Evaluate one rule. `None` when the rule is not applicable.
pub fn evaluate_rule(rule: &Rule, ctx: &RuleContext<'_>) -> Option<RuleTrace> {
    if !preconditions_hold(&rule.preconditions, ctx) {
        return None;
    }

    let trace = match &rule.logic {
        RuleLogic::VariancePct { threshold } => variance::evaluate(rule, *threshold, ctx),
        RuleLogic::GreaterThan => comparison::evaluate_greater_than(rule, ctx),
        RuleLogic::DocumentPresence { required_docs } => {
            documents::evaluate(rule, required_docs, ctx)
        }
        RuleLogic::ThreeWayMatch | RuleLogic::TwoWayMatch | RuleLogic::DuplicatePattern => {
            placeholder::evaluate_placeholder(rule)
        }
        RuleLogic::Unknown => placeholder::evaluate_unknown(rule),
    };

    Some(trace)
}

/// Build a trace row carrying the rule's identity and explanations.
pub(crate) fn trace(
    rule: &Rule,
    result: verdict_core::models::RuleResult,
    calculation: serde_json::Value,
    fail_actions: Vec<verdict_core::policy::FailAction>,
    extra: Option<serde_json::Value>,
) -> RuleTrace {
    RuleTrace {
        rule_id: rule.rule_id.clone(),
        group: rule.group.clone(),
        severity: rule.severity,
        result,
        calculation,
        fail_actions,
        explanation: rule.explanation.clone(),
        extra,
    }
}
