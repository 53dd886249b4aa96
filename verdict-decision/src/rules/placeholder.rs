//! Placeholder and unknown logic types fail closed: they always produce a
//! FAIL row so no group can pass silently through an unevaluated check.

use serde_json::json;
use verdict_core::models::{RuleResult, RuleTrace};
use verdict_core::policy::{FailAction, Rule};

use super::trace;

pub fn evaluate_placeholder(rule: &Rule) -> RuleTrace {
    let fail_actions = if rule.fail_actions.is_empty() {
        vec![FailAction::review()]
    } else {
        rule.fail_actions.clone()
    };
    trace(
        rule,
        RuleResult::Fail,
        json!({ "status": "NOT_IMPLEMENTED" }),
        fail_actions,
        Some(json!({ "note": "logic type not implemented, failing closed" })),
    )
}

pub fn evaluate_unknown(rule: &Rule) -> RuleTrace {
    trace(
        rule,
        RuleResult::Fail,
        json!({ "status": "UNKNOWN_LOGIC" }),
        vec![FailAction::review()],
        Some(json!({ "note": "unrecognized logic type, failing closed" })),
    )
}
