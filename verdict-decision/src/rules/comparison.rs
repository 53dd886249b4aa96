//! Strict PO-over-baseline comparison. PASS when the PO line price is at or
//! below the baseline value.

use serde_json::json;
use verdict_core::models::{RuleResult, RuleTrace};
use verdict_core::policy::Rule;

use super::{trace, RuleContext};

pub fn evaluate_greater_than(rule: &Rule, ctx: &RuleContext<'_>) -> RuleTrace {
    let (po, baseline) = match (ctx.po_price, ctx.baseline) {
        (Some(po), Some(b)) => (po, b.value),
        _ => {
            return trace(
                rule,
                RuleResult::Fail,
                json!({ "error": "MISSING_INPUT" }),
                rule.fail_actions.clone(),
                None,
            );
        }
    };

    let passed = po <= baseline;
    let calculation = json!({
        "po_price": po,
        "baseline_price": baseline,
        "exceeds_baseline": !passed,
    });

    let (result, fail_actions) = if passed {
        (RuleResult::Pass, Vec::new())
    } else {
        (RuleResult::Fail, rule.fail_actions.clone())
    };

    trace(rule, result, calculation, fail_actions, None)
}
