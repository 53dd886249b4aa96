//! Required-document checks. A document counts as present only when the
//! group's artifact set carries the generic `DOCUMENT` marker, which is set
//! from confirmed document links.

use serde_json::json;
use verdict_core::models::{RuleResult, RuleTrace};
use verdict_core::policy::Rule;

use super::{trace, RuleContext};

const DOCUMENT_ARTIFACT: &str = "DOCUMENT";

pub fn evaluate(rule: &Rule, required_docs: &[String], ctx: &RuleContext<'_>) -> RuleTrace {
    let documents_linked = ctx.artifacts_present.contains(DOCUMENT_ARTIFACT);

    let missing: Vec<&String> = if documents_linked {
        Vec::new()
    } else {
        required_docs.iter().collect()
    };

    let calculation = json!({
        "required_docs": required_docs,
        "documents_linked": documents_linked,
        "missing": missing,
    });

    let (result, fail_actions) = if missing.is_empty() {
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
    use verdict_core::policy::{Preconditions, RuleLogic, Severity};

    fn doc_rule() -> Rule {
        Rule {
            rule_id: "R_DOC".into(),
            group: Some("DOCS".into()),
            severity: Severity::High,
            preconditions: Preconditions::default(),
            logic: RuleLogic::DocumentPresence {
                required_docs: vec!["CONTRACT".into()],
            },
            fail_actions: Vec::new(),
            explanation: Default::default(),
        }
    }

    fn ctx(artifacts: &[&str]) -> RuleContext<'static> {
        let set: BTreeSet<String> = artifacts.iter().map(|s| s.to_string()).collect();
        RuleContext {
            po_price: None,
            baseline: None,
            baseline_source: None,
            artifacts_present: Box::leak(Box::new(set)),
        }
    }

    #[test]
    fn linked_document_satisfies_requirement() {
        let t = evaluate(&doc_rule(), &["CONTRACT".into()], &ctx(&["PO", "DOCUMENT"]));
        assert_eq!(t.result, RuleResult::Pass);
    }

    #[test]
    fn missing_document_fails_and_names_requirements() {
        let t = evaluate(&doc_rule(), &["CONTRACT".into()], &ctx(&["PO"]));
        assert_eq!(t.result, RuleResult::Fail);
        assert_eq!(t.calculation["missing"], serde_json::json!(["CONTRACT"]));
    }
}
