//! Severity aggregation. Per-group rule traces roll up to a group decision
//! over the LOW < MED < HIGH < CRITICAL lattice, and group outcomes roll up
//! to a single case-level decision.

use verdict_core::models::{GroupDecision, GroupOutcome, RuleTrace, RunDecision};
use verdict_core::policy::{FailAction, Severity};

/// Group confidence is a fixed heuristic keyed on baseline availability,
/// not derived from individual rules.
pub const CONFIDENCE_WITH_BASELINE: f64 = 0.85;
pub const CONFIDENCE_WITHOUT_BASELINE: f64 = 0.40;

pub const REASON_NO_BASELINE: &str = "NO_BASELINE_AVAILABLE";

/// Rolled-up outcome for one evidence group.
#[derive(Debug, Clone)]
pub struct GroupAggregate {
    pub decision: GroupDecision,
    pub risk_level: Severity,
    pub confidence: f64,
    pub reason_codes: Vec<String>,
    pub fail_actions: Vec<FailAction>,
}

/// Roll per-rule traces into one group decision.
///
/// No failures means PASS/LOW. Otherwise the group risk is the maximum
/// severity among failed rules, and the decision is REJECT only when that
/// maximum reaches CRITICAL. A missing baseline injects a
/// `NO_BASELINE_AVAILABLE` reason with a MED severity floor even when every
/// applicable rule passed.
pub fn aggregate_group(traces: &[RuleTrace], baseline_available: bool) -> GroupAggregate {
    let mut reason_codes: Vec<String> = Vec::new();
    let mut fail_actions: Vec<FailAction> = Vec::new();
    let mut max_failed: Option<Severity> = None;

    for t in traces {
        if !t.failed() {
            continue;
        }
        reason_codes.push(t.rule_id.clone());
        for action in &t.fail_actions {
            if !fail_actions.contains(action) {
                fail_actions.push(action.clone());
            }
        }
        max_failed = Some(match max_failed {
            Some(current) => current.max(t.severity),
            None => t.severity,
        });
    }

    if !baseline_available {
        reason_codes.push(REASON_NO_BASELINE.to_string());
        max_failed = Some(match max_failed {
            Some(current) => current.max(Severity::Med),
            None => Severity::Med,
        });
    }

    let (decision, risk_level) = match max_failed {
        None => (GroupDecision::Pass, Severity::Low),
        Some(sev) if sev == Severity::Critical => (GroupDecision::Reject, sev),
        Some(sev) => (GroupDecision::Review, sev),
    };

    let confidence = if baseline_available {
        CONFIDENCE_WITH_BASELINE
    } else {
        CONFIDENCE_WITHOUT_BASELINE
    };

    GroupAggregate {
        decision,
        risk_level,
        confidence,
        reason_codes,
        fail_actions,
    }
}

/// Case-level rollup across groups.
#[derive(Debug, Clone)]
pub struct CaseAggregate {
    pub decision: RunDecision,
    pub risk_level: Severity,
    pub confidence: f64,
    pub review_count: usize,
    pub reject_count: usize,
}

/// Roll group outcomes into one case decision: dominant risk, worst group
/// decision, unweighted mean confidence.
///
/// A case with zero evaluated groups fails closed to REVIEW at low
/// confidence; it is never auto-approved.
pub fn aggregate_case(groups: &[GroupOutcome]) -> CaseAggregate {
    if groups.is_empty() {
        return CaseAggregate {
            decision: RunDecision::Review,
            risk_level: Severity::Med,
            confidence: CONFIDENCE_WITHOUT_BASELINE,
            review_count: 0,
            reject_count: 0,
        };
    }

    let mut risk = Severity::Low;
    let mut review_count = 0usize;
    let mut reject_count = 0usize;
    let mut total_confidence = 0.0f64;

    for g in groups {
        risk = risk.max(g.risk_level);
        total_confidence += g.confidence;
        match g.decision {
            GroupDecision::Review => review_count += 1,
            GroupDecision::Reject => reject_count += 1,
            GroupDecision::Pass => {}
        }
    }

    let decision = if reject_count > 0 {
        RunDecision::Reject
    } else if review_count > 0 {
        RunDecision::Review
    } else {
        RunDecision::Approve
    };

    CaseAggregate {
        decision,
        risk_level: risk,
        confidence: total_confidence / groups.len() as f64,
        review_count,
        reject_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::models::RuleResult;

    fn trace(rule_id: &str, severity: Severity, result: RuleResult) -> RuleTrace {
        RuleTrace {
            rule_id: rule_id.into(),
            group: Some("PRICE".into()),
            severity,
            result,
            calculation: serde_json::Value::Null,
            fail_actions: vec![FailAction::review()],
            explanation: Default::default(),
            extra: None,
        }
    }

    #[test]
    fn all_pass_is_low_risk_pass() {
        let agg = aggregate_group(&[trace("R1", Severity::High, RuleResult::Pass)], true);
        assert_eq!(agg.decision, GroupDecision::Pass);
        assert_eq!(agg.risk_level, Severity::Low);
        assert!(agg.reason_codes.is_empty());
    }

    #[test]
    fn critical_failure_rejects() {
        let traces = [
            trace("R1", Severity::Low, RuleResult::Pass),
            trace("R2", Severity::Med, RuleResult::Fail),
            trace("R3", Severity::Critical, RuleResult::Fail),
        ];
        let agg = aggregate_group(&traces, true);
        assert_eq!(agg.decision, GroupDecision::Reject);
        assert_eq!(agg.risk_level, Severity::Critical);
        assert_eq!(agg.reason_codes, vec!["R2", "R3"]);
    }

    #[test]
    fn med_failure_reviews() {
        let traces = [
            trace("R1", Severity::Low, RuleResult::Pass),
            trace("R2", Severity::Med, RuleResult::Fail),
        ];
        let agg = aggregate_group(&traces, true);
        assert_eq!(agg.decision, GroupDecision::Review);
        assert_eq!(agg.risk_level, Severity::Med);
    }

    #[test]
    fn missing_baseline_floors_severity_at_med() {
        let agg = aggregate_group(&[], false);
        assert_eq!(agg.decision, GroupDecision::Review);
        assert_eq!(agg.risk_level, Severity::Med);
        assert_eq!(agg.confidence, CONFIDENCE_WITHOUT_BASELINE);
        assert_eq!(agg.reason_codes, vec![REASON_NO_BASELINE]);
    }

    #[test]
    fn missing_baseline_does_not_lower_higher_risk() {
        let agg = aggregate_group(&[trace("R1", Severity::High, RuleResult::Fail)], false);
        assert_eq!(agg.risk_level, Severity::High);
        assert!(agg.reason_codes.contains(&REASON_NO_BASELINE.to_string()));
    }

    #[test]
    fn fail_actions_are_deduplicated() {
        let traces = [
            trace("R1", Severity::Med, RuleResult::Fail),
            trace("R2", Severity::Med, RuleResult::Fail),
        ];
        let agg = aggregate_group(&traces, true);
        assert_eq!(agg.fail_actions.len(), 1);
    }

    #[test]
    fn case_rollup_takes_worst_group() {
        let groups = [
            GroupOutcome {
                group_id: "g1".into(),
                decision: GroupDecision::Pass,
                risk_level: Severity::Low,
                confidence: 0.85,
            },
            GroupOutcome {
                group_id: "g2".into(),
                decision: GroupDecision::Review,
                risk_level: Severity::High,
                confidence: 0.40,
            },
        ];
        let agg = aggregate_case(&groups);
        assert_eq!(agg.decision, RunDecision::Review);
        assert_eq!(agg.risk_level, Severity::High);
        assert!((agg.confidence - 0.625).abs() < 1e-9);
    }

    #[test]
    fn empty_case_fails_closed_to_review() {
        let agg = aggregate_case(&[]);
        assert_eq!(agg.decision, RunDecision::Review);
        assert_eq!(agg.risk_level, Severity::Med);
        assert_eq!(agg.confidence, CONFIDENCE_WITHOUT_BASELINE);
        assert_eq!(agg.review_count, 0);
        assert_eq!(agg.reject_count, 0);
    }

    #[test]
    fn any_reject_rejects_the_case() {
        let groups = [GroupOutcome {
            group_id: "g1".into(),
            decision: GroupDecision::Reject,
            risk_level: Severity::Critical,
            confidence: 0.85,
        }];
        assert_eq!(aggregate_case(&groups).decision, RunDecision::Reject);
    }
}
