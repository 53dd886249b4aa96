//! Price variance against the selected baseline. PASS when the signed
//! variance `(po - baseline) / baseline` stays at or below the threshold.

use serde_json::json;
use verdict_core::models::RuleResult;
use verdict_core::policy::Rule;

use super::{trace, RuleContext};
use crate::calc::round_half_up;

pub fn evaluate(rule: &Rule, threshold: f64, ctx: &RuleContext<'_>) -> verdict_core::models::RuleTrace {
    let (po, baseline) = match (ctx.po_price, ctx.baseline) {
        (Some(po), Some(b)) if b.value != 0.0 => (po, b.value),
        _ => {
            return trace(
                rule,
                RuleResult::Fail,
                json!({ "error": "MISSING_INPUT", "threshold": threshold }),
                rule.fail_actions.clone(),
                None,
            );
        }
    };

    let variance = round_half_up((po - baseline) / baseline, 6);
    let passed = variance <= threshold;

    let calculation = json!({
        "po_price": po,
        "baseline_price": baseline,
        "variance_pct": variance,
        "threshold": threshold,
    });

    let (result, fail_actions) = if passed {
        (RuleResult::Pass, Vec::new())
    } else {
        (RuleResult::Fail, rule.fail_actions.clone())
    };

    trace(rule, result, calculation, fail_actions, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use verdict_core::models::Baseline;
    use verdict_core::policy::{Preconditions, RuleLogic, Severity};

    fn variance_rule(threshold: f64) -> Rule {
        Rule {
            rule_id: "R_VAR".into(),
            group: Some("PRICE".into()),
            severity: Severity::Med,
            preconditions: Preconditions::default(),
            logic: RuleLogic::VariancePct { threshold },
            fail_actions: Vec::new(),
            explanation: Default::default(),
        }
    }

    fn ctx(po: Option<f64>, baseline: Option<&Baseline>) -> RuleContext<'_> {
        RuleContext {
            po_price: po,
            baseline,
            baseline_source: None,
            artifacts_present: Box::leak(Box::new(BTreeSet::new())),
        }
    }

    #[test]
    fn within_threshold_passes() {
        let b = Baseline { value: 100.0, currency: None };
        let t = evaluate(&variance_rule(0.05), 0.05, &ctx(Some(104.0), Some(&b)));
        assert_eq!(t.result, RuleResult::Pass);
        assert_eq!(t.calculation["variance_pct"], serde_json::json!(0.04));
    }

    #[test]
    fn above_threshold_fails_with_calculation() {
        let b = Baseline { value: 100.0, currency: None };
        let t = evaluate(&variance_rule(0.05), 0.05, &ctx(Some(110.0), Some(&b)));
        assert_eq!(t.result, RuleResult::Fail);
        assert_eq!(t.calculation["variance_pct"], serde_json::json!(0.1));
    }

    #[test]
    fn negative_variance_passes() {
        let b = Baseline { value: 100.0, currency: None };
        let t = evaluate(&variance_rule(0.0), 0.0, &ctx(Some(90.0), Some(&b)));
        assert_eq!(t.result, RuleResult::Pass);
    }

    #[test]
    fn missing_baseline_fails_closed() {
        let t = evaluate(&variance_rule(0.05), 0.05, &ctx(Some(100.0), None));
        assert_eq!(t.result, RuleResult::Fail);
        assert_eq!(t.calculation["error"], "MISSING_INPUT");
    }
}
