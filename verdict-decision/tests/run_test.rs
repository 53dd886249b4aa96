//! End-to-end decision runs: selection feeding the runner, aggregation,
//! lifecycle transitions, audit emission, and failure handling.

use std::sync::Arc;

use test_fixtures::{
    confirmed_link, evidence, group, line_item, price_fact, sample_policy, ungrouped_group,
    FailingAuditSink, InMemoryCaseStore, InMemoryResultStore, InMemoryRunStore, MemoryAuditSink,
};
use verdict_core::models::{
    CaseSelection, GroupDecision, RunDecision, RunStatus,
};
use verdict_core::policy::Severity;
use verdict_decision::DecisionRunner;
use verdict_selection::SelectionEngine;

const CASE: &str = "case-1";
const DOMAIN: &str = "procurement";

struct Harness {
    engine: SelectionEngine,
    runner: DecisionRunner,
    runs: Arc<InMemoryRunStore>,
    results: Arc<InMemoryResultStore>,
    audit: Arc<MemoryAuditSink>,
}

fn harness(store: InMemoryCaseStore) -> Harness {
    let policy = Arc::new(sample_policy());
    let store = Arc::new(store);
    let runs = Arc::new(InMemoryRunStore::default());
    let results = Arc::new(InMemoryResultStore::default());
    let audit = Arc::new(MemoryAuditSink::default());

    let engine = SelectionEngine::new(
        policy.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    let runner = DecisionRunner::new(
        policy,
        store.clone(),
        store.clone(),
        store,
        runs.clone(),
        results.clone(),
        audit.clone(),
    );

    Harness {
        engine,
        runner,
        runs,
        results,
        audit,
    }
}

/// One anchored group with a contract-price fact matching the PO price and a
/// confirmed document link.
fn clean_store(po_price: f64) -> InMemoryCaseStore {
    InMemoryCaseStore {
        groups: vec![group(CASE, "g1", "item-1", "SKU:A")],
        facts: vec![price_fact("g1", "CONTRACT_PRICE", 100.0, "THB", Some("PER_SKU"))],
        evidence: vec![evidence("g1", "PRICE", 0.9)],
        line_items: vec![line_item(CASE, "item-1", po_price, "THB")],
        links: vec![(CASE.to_string(), confirmed_link("doc-1"))],
    }
}

// ── happy path ───────────────────────────────────────────────────────────────

#[test]
fn clean_case_approves_with_high_confidence() {
    let h = harness(clean_store(100.0));
    let selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();

    let outcome = h.runner.run_case(CASE, DOMAIN, &selection).unwrap();

    assert_eq!(outcome.decision, RunDecision::Approve);
    assert_eq!(outcome.risk_level, Severity::Low);
    assert_eq!(outcome.confidence, 0.85);
    assert_eq!(outcome.groups.len(), 1);
    assert_eq!(outcome.groups[0].decision, GroupDecision::Pass);

    let run = h.runs.get_run_by_id(&outcome.run_id);
    assert_eq!(run.run_status, RunStatus::Completed);
    assert_eq!(run.decision, Some(RunDecision::Approve));
    assert!(run.completed_at.is_some());

    let rows = h.results.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].reason_codes.is_empty());
    // All three rules applied and passed.
    assert_eq!(rows[0].trace.rules.len(), 3);
    assert!(rows[0].trace.rules.iter().all(|r| !r.failed()));
}

#[test]
fn audit_trail_covers_the_whole_lifecycle() {
    let h = harness(clean_store(100.0));
    let selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();
    h.runner.run_case(CASE, DOMAIN, &selection).unwrap();

    let types = h.audit.event_types();
    assert_eq!(types.first().map(String::as_str), Some("DECISION_RUN_STARTED"));
    assert_eq!(types.last().map(String::as_str), Some("DECISION_RUN_DONE"));
    assert!(types.iter().any(|t| t == "GROUP_EVAL_STARTED"));
    assert!(types.iter().any(|t| t == "BASELINE_SELECTED"));
    assert!(types.iter().any(|t| t == "GROUP_DECISION_FINALIZED"));
}

// ── rule failures ────────────────────────────────────────────────────────────

#[test]
fn variance_breach_reviews_the_case() {
    // PO at 110 vs baseline 100 breaches both the 5% variance rule and the
    // price ceiling.
    let h = harness(clean_store(110.0));
    let selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();

    let outcome = h.runner.run_case(CASE, DOMAIN, &selection).unwrap();

    assert_eq!(outcome.decision, RunDecision::Review);
    assert_eq!(outcome.risk_level, Severity::High);

    let rows = h.results.rows.lock().unwrap();
    assert_eq!(
        rows[0].reason_codes,
        vec!["R_PRICE_VARIANCE", "R_PO_OVER_BASELINE"]
    );

    let variance = rows[0]
        .trace
        .rules
        .iter()
        .find(|r| r.rule_id == "R_PRICE_VARIANCE")
        .unwrap();
    assert!(variance.failed());
    assert_eq!(variance.calculation["po_price"], serde_json::json!(110.0));
    assert_eq!(variance.calculation["baseline_price"], serde_json::json!(100.0));
    assert_eq!(variance.calculation["variance_pct"], serde_json::json!(0.1));

    // The declared PCT_DIFF calculation also ran and was traced.
    assert_eq!(
        rows[0].trace.calculations.values["variance_pct"],
        serde_json::json!(10.0)
    );
}

#[test]
fn missing_contract_document_fails_presence_rule() {
    let mut store = clean_store(100.0);
    store.links.clear();
    let h = harness(store);
    let selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();

    let outcome = h.runner.run_case(CASE, DOMAIN, &selection).unwrap();

    assert_eq!(outcome.decision, RunDecision::Review);
    assert_eq!(outcome.risk_level, Severity::High);
    let rows = h.results.rows.lock().unwrap();
    assert_eq!(rows[0].reason_codes, vec!["R_CONTRACT_PRESENT"]);
}

// ── soft failure paths ───────────────────────────────────────────────────────

#[test]
fn missing_anchor_forces_review_without_rule_evaluation() {
    let store = InMemoryCaseStore {
        groups: vec![ungrouped_group(CASE, "g1")],
        facts: vec![price_fact("g1", "CONTRACT_PRICE", 100.0, "THB", Some("PER_SKU"))],
        evidence: vec![],
        line_items: vec![line_item(CASE, "item-1", 100.0, "THB")],
        links: vec![],
    };
    let h = harness(store);
    let selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();

    let outcome = h.runner.run_case(CASE, DOMAIN, &selection).unwrap();

    assert_eq!(outcome.groups[0].decision, GroupDecision::Review);
    assert_eq!(outcome.groups[0].risk_level, Severity::High);
    assert_eq!(outcome.groups[0].confidence, 0.20);

    let rows = h.results.rows.lock().unwrap();
    assert_eq!(rows[0].reason_codes, vec!["PO_LINE_MISSING_FOR_GROUP"]);
    assert!(rows[0].trace.rules.is_empty());
    assert!(!rows[0].trace.inputs.po_line_found);
    assert!(!rows[0].trace.notes.is_empty());
}

#[test]
fn group_absent_from_selection_is_reviewed_not_dropped() {
    // Two anchored groups in the case, but the selection payload only covers
    // g1. Every case group still gets a result row; g2 evaluates as
    // baseline-unavailable.
    let store = InMemoryCaseStore {
        groups: vec![
            group(CASE, "g1", "item-1", "SKU:A"),
            group(CASE, "g2", "item-2", "SKU:B"),
        ],
        facts: vec![
            price_fact("g1", "CONTRACT_PRICE", 100.0, "THB", Some("PER_SKU")),
            price_fact("g2", "CONTRACT_PRICE", 100.0, "THB", Some("PER_SKU")),
        ],
        evidence: vec![],
        line_items: vec![
            line_item(CASE, "item-1", 100.0, "THB"),
            line_item(CASE, "item-2", 100.0, "THB"),
        ],
        links: vec![(CASE.to_string(), confirmed_link("doc-1"))],
    };
    let h = harness(store);
    let mut selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();
    selection.groups.retain(|s| s.group_id == "g1");

    let outcome = h.runner.run_case(CASE, DOMAIN, &selection).unwrap();

    assert_eq!(outcome.groups.len(), 2);
    let rows = h.results.rows.lock().unwrap();
    assert_eq!(rows.len(), 2);

    let g2 = rows.iter().find(|r| r.group_id == "g2").unwrap();
    assert_eq!(g2.decision_status, GroupDecision::Review);
    assert_eq!(g2.confidence, 0.40);
    assert!(g2
        .reason_codes
        .contains(&"NO_BASELINE_AVAILABLE".to_string()));
    assert!(g2.trace.selection.is_none());
    assert!(!g2.trace.notes.is_empty());
}

#[test]
fn po_artifact_is_recorded_even_without_line_items() {
    let mut store = clean_store(100.0);
    store.line_items.clear();
    let h = harness(store);
    let selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();

    let outcome = h.runner.run_case(CASE, DOMAIN, &selection).unwrap();

    // The anchor resolves to nothing, so the group falls into the
    // missing-line review path, but the PO artifact itself is always listed.
    assert_eq!(outcome.groups[0].decision, GroupDecision::Review);
    let rows = h.results.rows.lock().unwrap();
    assert!(!rows[0].trace.inputs.po_line_found);
    assert!(rows[0]
        .trace
        .inputs
        .artifacts_present
        .contains(&"PO".to_string()));
}

#[test]
fn unavailable_baseline_reviews_with_med_floor() {
    // Anchored group, PO line present, but no facts at all: selection falls
    // back and the run reviews with the MED floor and lowered confidence.
    let store = InMemoryCaseStore {
        groups: vec![group(CASE, "g1", "item-1", "SKU:A")],
        facts: vec![],
        evidence: vec![],
        line_items: vec![line_item(CASE, "item-1", 100.0, "THB")],
        links: vec![(CASE.to_string(), confirmed_link("doc-1"))],
    };
    let h = harness(store);
    let selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();

    let outcome = h.runner.run_case(CASE, DOMAIN, &selection).unwrap();

    assert_eq!(outcome.groups[0].decision, GroupDecision::Review);
    assert_eq!(outcome.groups[0].risk_level, Severity::Med);
    assert_eq!(outcome.groups[0].confidence, 0.40);
    let rows = h.results.rows.lock().unwrap();
    assert!(rows[0]
        .reason_codes
        .contains(&"NO_BASELINE_AVAILABLE".to_string()));
}

// ── case rollup ──────────────────────────────────────────────────────────────

#[test]
fn two_group_case_takes_worst_group() {
    // g1 is clean, g2 breaches the variance rule.
    let store = InMemoryCaseStore {
        groups: vec![
            group(CASE, "g1", "item-1", "SKU:A"),
            group(CASE, "g2", "item-2", "SKU:B"),
        ],
        facts: vec![
            price_fact("g1", "CONTRACT_PRICE", 100.0, "THB", Some("PER_SKU")),
            price_fact("g2", "CONTRACT_PRICE", 100.0, "THB", Some("PER_SKU")),
        ],
        evidence: vec![],
        line_items: vec![
            line_item(CASE, "item-1", 100.0, "THB"),
            line_item(CASE, "item-2", 150.0, "THB"),
        ],
        links: vec![(CASE.to_string(), confirmed_link("doc-1"))],
    };
    let h = harness(store);
    let selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();

    let outcome = h.runner.run_case(CASE, DOMAIN, &selection).unwrap();

    assert_eq!(outcome.decision, RunDecision::Review);
    assert_eq!(outcome.risk_level, Severity::High);
    assert_eq!(outcome.confidence, 0.85);
    assert_eq!(outcome.groups.len(), 2);

    let run = h.runs.get_run_by_id(&outcome.run_id);
    let summary = run.summary.unwrap();
    assert_eq!(summary["groups"], serde_json::json!(2));
    assert_eq!(summary["review_count"], serde_json::json!(1));
}

#[test]
fn bounded_worker_pool_reaches_the_same_outcome() {
    let store = InMemoryCaseStore {
        groups: vec![
            group(CASE, "g1", "item-1", "SKU:A"),
            group(CASE, "g2", "item-2", "SKU:B"),
        ],
        facts: vec![
            price_fact("g1", "CONTRACT_PRICE", 100.0, "THB", Some("PER_SKU")),
            price_fact("g2", "CONTRACT_PRICE", 100.0, "THB", Some("PER_SKU")),
        ],
        evidence: vec![],
        line_items: vec![
            line_item(CASE, "item-1", 100.0, "THB"),
            line_item(CASE, "item-2", 150.0, "THB"),
        ],
        links: vec![(CASE.to_string(), confirmed_link("doc-1"))],
    };
    let h = harness(store);
    let runner = h.runner.with_parallelism(2).unwrap();
    let selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();

    let outcome = runner.run_case(CASE, DOMAIN, &selection).unwrap();

    assert_eq!(outcome.decision, RunDecision::Review);
    assert_eq!(outcome.groups.len(), 2);
    // Group order stays deterministic under the bounded pool.
    assert_eq!(outcome.groups[0].group_id, "g1");
    assert_eq!(outcome.groups[1].group_id, "g2");
    assert_eq!(
        h.runs.get_run_by_id(&outcome.run_id).run_status,
        RunStatus::Completed
    );
}

// ── failure handling ─────────────────────────────────────────────────────────

#[test]
fn selection_case_mismatch_marks_the_run_failed() {
    let h = harness(clean_store(100.0));
    let mut selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();
    selection.case_id = "other-case".to_string();

    let err = h.runner.run_case(CASE, DOMAIN, &selection).unwrap_err();
    assert!(err.to_string().contains("selection case mismatch"));

    let runs = h.runs.runs.lock().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_status, RunStatus::Failed);
    assert!(runs[0].summary.as_ref().unwrap()["error"]
        .as_str()
        .unwrap()
        .contains("selection case mismatch"));
    drop(runs);

    assert_eq!(
        h.audit.event_types().last().map(String::as_str),
        Some("DECISION_RUN_FAILED")
    );
}

#[test]
fn unknown_domain_in_selection_fails_the_run() {
    let h = harness(clean_store(100.0));
    let selection = CaseSelection {
        case_id: CASE.to_string(),
        domain: "logistics".to_string(),
        groups: vec![],
    };

    let err = h.runner.run_case(CASE, "logistics", &selection).unwrap_err();
    assert!(err.to_string().contains("logistics"));

    let runs = h.runs.runs.lock().unwrap();
    assert_eq!(runs[0].run_status, RunStatus::Failed);
}

#[test]
fn failing_audit_sink_does_not_abort_the_run() {
    let policy = Arc::new(sample_policy());
    let store = Arc::new(clean_store(100.0));
    let runs = Arc::new(InMemoryRunStore::default());
    let results = Arc::new(InMemoryResultStore::default());

    let engine = SelectionEngine::new(
        policy.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    let runner = DecisionRunner::new(
        policy,
        store.clone(),
        store.clone(),
        store,
        runs.clone(),
        results,
        Arc::new(FailingAuditSink),
    );

    let selection = engine.select_for_case(CASE, DOMAIN).unwrap();
    let outcome = runner.run_case(CASE, DOMAIN, &selection).unwrap();
    assert_eq!(outcome.decision, RunDecision::Approve);
    assert_eq!(
        runs.get_run_by_id(&outcome.run_id).run_status,
        RunStatus::Completed
    );
}

// ── determinism and replay ───────────────────────────────────────────────────

#[test]
fn reruns_share_the_input_hash_but_not_run_ids() {
    let h = harness(clean_store(100.0));
    let selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();

    let first = h.runner.run_case(CASE, DOMAIN, &selection).unwrap();
    let second = h.runner.run_case(CASE, DOMAIN, &selection).unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.decision, second.decision);
    assert_eq!(first.risk_level, second.risk_level);

    let runs = h.runs.runs.lock().unwrap();
    assert_eq!(runs[0].input_hash, runs[1].input_hash);
    drop(runs);

    // Each run owns its result rows; the second run never rewrote the first.
    let rows = h.results.rows.lock().unwrap();
    assert_eq!(rows.len(), 2);
    assert_ne!(rows[0].run_id, rows[1].run_id);
}

#[test]
fn latest_completed_run_is_replayable() {
    let h = harness(clean_store(100.0));
    let selection = h.engine.select_for_case(CASE, DOMAIN).unwrap();
    let outcome = h.runner.run_case(CASE, DOMAIN, &selection).unwrap();

    let latest = h
        .runs
        .get_latest_completed_for(CASE)
        .expect("completed run");
    assert_eq!(latest.run_id, outcome.run_id);
    assert_eq!(latest.inputs_snapshot["domain"], serde_json::json!(DOMAIN));
    assert_eq!(
        latest.inputs_snapshot["selection_summary"]["group_count"],
        serde_json::json!(1)
    );
}
