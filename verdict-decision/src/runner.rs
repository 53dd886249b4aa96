//! Decision run orchestration.
//!
//! A run is created STARTED before anything else so that even an invalid
//! selection payload leaves an auditable FAILED row behind. Groups are
//! evaluated in parallel, each writing its own result row idempotently;
//! the run then transitions exactly once to COMPLETED or FAILED.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use rayon::prelude::*;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use verdict_core::errors::{EngineError, StoreError, VerdictResult};
use verdict_core::hash::input_hash;
use verdict_core::models::{
    AuditEvent, AuditEventType, CalcSection, CaseSelection, DecisionResult, DecisionRun,
    EvidenceGroup, EvidenceRefs, GroupDecision, GroupOutcome, GroupTrace, LineItem, PolicyRef,
    RunOutcome, RunStatus, SelectionResult, TraceInputs, TraceSelection,
};
use verdict_core::policy::{DomainProfile, FailAction, PolicyBundle, Severity};
use verdict_core::traits::{
    AuditSink, DecisionResultStore, DecisionRunStore, DocumentLinkStore, EvidenceGroupStore,
    LineItemStore,
};

use crate::aggregate;
use crate::calc;
use crate::rules::{evaluate_rule, RuleContext};

const DEFAULT_ACTOR: &str = "system";
const ARTIFACT_PO: &str = "PO";
const ARTIFACT_DOCUMENT: &str = "DOCUMENT";
const REASON_PO_LINE_MISSING: &str = "PO_LINE_MISSING_FOR_GROUP";
const MISSING_ANCHOR_CONFIDENCE: f64 = 0.20;

/// Runs the decision pipeline for one case against a selection payload.
pub struct DecisionRunner {
    policy: Arc<PolicyBundle>,
    groups: Arc<dyn EvidenceGroupStore>,
    line_items: Arc<dyn LineItemStore>,
    links: Arc<dyn DocumentLinkStore>,
    runs: Arc<dyn DecisionRunStore>,
    results: Arc<dyn DecisionResultStore>,
    audit: Arc<dyn AuditSink>,
    actor: String,
    pool: Option<rayon::ThreadPool>,
}

impl DecisionRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        policy: Arc<PolicyBundle>,
        groups: Arc<dyn EvidenceGroupStore>,
        line_items: Arc<dyn LineItemStore>,
        links: Arc<dyn DocumentLinkStore>,
        runs: Arc<dyn DecisionRunStore>,
        results: Arc<dyn DecisionResultStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        DecisionRunner {
            policy,
            groups,
            line_items,
            links,
            runs,
            results,
            audit,
            actor: DEFAULT_ACTOR.to_string(),
            pool: None,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Cap worker threads for group evaluation. Zero leaves rayon's default.
    ///
    /// The pool is owned by this runner; the process-global rayon pool is
    /// never touched.
    pub fn with_parallelism(mut self, threads: usize) -> VerdictResult<Self> {
        if threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| EngineError::WorkerPoolBuild {
                    reason: e.to_string(),
                })?;
            self.pool = Some(pool);
        }
        Ok(self)
    }

    /// Execute one decision run over a case.
    ///
    /// The STARTED row is written before selection validation so a bad
    /// payload still produces a permanent FAILED record. Any error after
    /// creation marks the run FAILED and propagates.
    pub fn run_case(
        &self,
        case_id: &str,
        domain_code: &str,
        selection: &CaseSelection,
    ) -> VerdictResult<RunOutcome> {
        let run_id = Uuid::new_v4().to_string();
        let summary = selection.summary();
        let hash = input_hash(
            case_id,
            &self.policy.meta.policy_id,
            &self.policy.meta.version,
            &summary,
        );

        let selection_value =
            serde_json::to_value(selection).map_err(|e| StoreError::SerializationFailed {
                reason: e.to_string(),
            })?;
        let snapshot = json!({
            "domain": domain_code,
            "selection_summary": summary,
            "selection": selection_value,
        });

        let run = DecisionRun {
            run_id: run_id.clone(),
            case_id: case_id.to_string(),
            policy_id: self.policy.meta.policy_id.clone(),
            policy_version: self.policy.meta.version.clone(),
            run_status: RunStatus::Started,
            input_hash: hash.clone(),
            inputs_snapshot: snapshot,
            decision: None,
            risk_level: None,
            confidence: None,
            summary: None,
            created_by: self.actor.clone(),
            created_at: Utc::now(),
            completed_at: None,
        };
        self.runs.create_run(&run)?;
        self.emit(AuditEvent::new(
            case_id,
            AuditEventType::DecisionRunStarted,
            &self.actor,
            Some(&run_id),
            json!({ "input_hash": hash, "group_count": selection.groups.len() }),
        ));

        match self.execute(&run_id, case_id, domain_code, selection) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let reason = err.to_string();
                if let Err(fail_err) = self.runs.fail_run(&run_id, &reason) {
                    warn!(run_id = %run_id, error = %fail_err, "could not mark run FAILED");
                }
                self.emit(AuditEvent::new(
                    case_id,
                    AuditEventType::DecisionRunFailed,
                    &self.actor,
                    Some(&run_id),
                    json!({ "error": reason }),
                ));
                Err(err)
            }
        }
    }

    fn execute(
        &self,
        run_id: &str,
        case_id: &str,
        domain_code: &str,
        selection: &CaseSelection,
    ) -> VerdictResult<RunOutcome> {
        if selection.case_id != case_id {
            return Err(EngineError::SelectionCaseMismatch {
                expected: case_id.to_string(),
                got: selection.case_id.clone(),
            }
            .into());
        }
        if selection.domain != domain_code {
            return Err(EngineError::SelectionDomainMismatch {
                expected: domain_code.to_string(),
                got: selection.domain.clone(),
            }
            .into());
        }
        let profile = self.policy.domain(domain_code)?;

        let po_by_id: HashMap<String, LineItem> = self
            .line_items
            .list_line_items(case_id)?
            .into_iter()
            .map(|li| (li.item_id.clone(), li))
            .collect();
        // Evaluation covers every group the case holds, not just the ones the
        // selection payload mentions. A group the selector skipped still gets
        // a result row, evaluated as baseline-unavailable.
        let case_groups = self.groups.list_groups(case_id)?;
        let selection_index: HashMap<&str, &SelectionResult> = selection
            .groups
            .iter()
            .map(|s| (s.group_id.as_str(), s))
            .collect();

        let mut artifacts: BTreeSet<String> = BTreeSet::new();
        artifacts.insert(ARTIFACT_PO.to_string());
        if !self.links.list_confirmed_links(case_id)?.is_empty() {
            artifacts.insert(ARTIFACT_DOCUMENT.to_string());
        }

        let evaluate_all = || {
            case_groups
                .par_iter()
                .map(|group| {
                    self.evaluate_group(
                        run_id,
                        case_id,
                        profile,
                        group,
                        selection_index.get(group.group_id.as_str()).copied(),
                        &po_by_id,
                        &artifacts,
                    )
                })
                .collect::<VerdictResult<Vec<_>>>()
        };
        let outcomes: Vec<GroupOutcome> = match &self.pool {
            Some(pool) => pool.install(evaluate_all),
            None => evaluate_all(),
        }?;

        let case = aggregate::aggregate_case(&outcomes);
        let run_summary = json!({
            "groups": outcomes.len(),
            "review_count": case.review_count,
            "reject_count": case.reject_count,
        });
        self.runs.complete_run(
            run_id,
            case.decision,
            case.risk_level,
            case.confidence,
            &run_summary,
        )?;
        self.emit(AuditEvent::new(
            case_id,
            AuditEventType::DecisionRunDone,
            &self.actor,
            Some(run_id),
            json!({
                "decision": case.decision.as_str(),
                "risk_level": case.risk_level.as_str(),
                "confidence": case.confidence,
            }),
        ));
        info!(
            run_id,
            case_id,
            decision = case.decision.as_str(),
            risk_level = case.risk_level.as_str(),
            "decision run completed"
        );

        Ok(RunOutcome {
            run_id: run_id.to_string(),
            case_id: case_id.to_string(),
            domain: domain_code.to_string(),
            decision: case.decision,
            risk_level: case.risk_level,
            confidence: case.confidence,
            groups: outcomes,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate_group(
        &self,
        run_id: &str,
        case_id: &str,
        profile: &DomainProfile,
        group: &EvidenceGroup,
        sel: Option<&SelectionResult>,
        po_by_id: &HashMap<String, LineItem>,
        artifacts: &BTreeSet<String>,
    ) -> VerdictResult<GroupOutcome> {
        let group_id = group.group_id.as_str();
        self.emit(AuditEvent::new(
            case_id,
            AuditEventType::GroupEvalStarted,
            &self.actor,
            Some(run_id),
            json!({ "group_id": group_id }),
        ));

        let anchor_id = group.anchor_id.as_deref();
        let po_line = anchor_id.and_then(|id| po_by_id.get(id));
        let baseline = sel.and_then(|s| s.baseline.as_ref());
        let evidence_refs = sel.map(SelectionResult::winning_refs).unwrap_or_default();

        let trace_inputs = TraceInputs {
            group_id: group_id.to_string(),
            anchor_type: group.anchor_type,
            anchor_id: anchor_id.map(str::to_string),
            po_line_found: po_line.is_some(),
            artifacts_present: artifacts.iter().cloned().collect(),
            po_item: po_line.cloned(),
        };
        let trace_selection = sel.map(|s| TraceSelection {
            selected_technique: s.selected_technique.clone(),
            baseline: s.baseline.clone(),
            baseline_source: s.baseline_source.clone(),
            readiness_flags: s.readiness_flags,
            selection_refs: s.winning_refs(),
        });
        let mut notes = Vec::new();
        if sel.is_none() {
            notes.push("no selection entry for group; baseline treated as unavailable".to_string());
        }

        if let Some(baseline) = baseline {
            self.emit(AuditEvent::new(
                case_id,
                AuditEventType::BaselineSelected,
                &self.actor,
                Some(run_id),
                json!({
                    "group_id": group_id,
                    "technique_id": sel.map(|s| s.selected_technique.as_str()),
                    "baseline_value": baseline.value,
                    "baseline_currency": baseline.currency,
                }),
            ));
        }

        let result = match po_line {
            Some(po) => {
                let ctx = calc::build_context(po, baseline);
                let calculations =
                    calc::compute_all(&profile.calculations, &ctx, &self.policy.meta.rounding);

                let rule_ctx = RuleContext {
                    po_price: po.unit_price,
                    baseline,
                    baseline_source: sel.and_then(|s| s.baseline_source.as_ref()),
                    artifacts_present: artifacts,
                };
                let traces: Vec<_> = profile
                    .rules
                    .iter()
                    .filter_map(|rule| evaluate_rule(rule, &rule_ctx))
                    .collect();

                for t in traces.iter().filter(|t| t.failed()) {
                    self.emit(AuditEvent::new(
                        case_id,
                        AuditEventType::RuleFailed,
                        &self.actor,
                        Some(run_id),
                        json!({
                            "group_id": group_id,
                            "rule_id": t.rule_id,
                            "severity": t.severity.as_str(),
                        }),
                    ));
                }

                let agg = aggregate::aggregate_group(&traces, baseline.is_some());
                self.build_result(
                    run_id,
                    group_id,
                    agg.decision,
                    agg.risk_level,
                    agg.confidence,
                    agg.reason_codes,
                    agg.fail_actions,
                    evidence_refs,
                    GroupTrace {
                        policy: self.policy_ref(),
                        inputs: trace_inputs,
                        selection: trace_selection,
                        calculations,
                        rules: traces,
                        notes,
                    },
                )
            }
            // Missing anchor: never evaluate rules against a group we cannot
            // tie back to a PO line.
            None => {
                notes.push("rule evaluation skipped: no PO line item anchor".to_string());
                self.build_result(
                    run_id,
                    group_id,
                    GroupDecision::Review,
                    Severity::High,
                    MISSING_ANCHOR_CONFIDENCE,
                    vec![REASON_PO_LINE_MISSING.to_string()],
                    vec![FailAction::review()],
                    evidence_refs,
                    GroupTrace {
                        policy: self.policy_ref(),
                        inputs: trace_inputs,
                        selection: trace_selection,
                        calculations: CalcSection::default(),
                        rules: Vec::new(),
                        notes,
                    },
                )
            }
        };

        self.results.upsert_result(&result)?;
        self.emit(AuditEvent::new(
            case_id,
            AuditEventType::GroupDecisionFinalized,
            &self.actor,
            Some(run_id),
            json!({
                "group_id": group_id,
                "decision": result.decision_status,
                "risk_level": result.risk_level.as_str(),
                "reason_codes": result.reason_codes,
            }),
        ));

        Ok(GroupOutcome {
            group_id: group_id.to_string(),
            decision: result.decision_status,
            risk_level: result.risk_level,
            confidence: result.confidence,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn build_result(
        &self,
        run_id: &str,
        group_id: &str,
        decision: GroupDecision,
        risk_level: Severity,
        confidence: f64,
        reason_codes: Vec<String>,
        fail_actions: Vec<FailAction>,
        evidence_refs: EvidenceRefs,
        trace: GroupTrace,
    ) -> DecisionResult {
        DecisionResult {
            result_id: Uuid::new_v4().to_string(),
            run_id: run_id.to_string(),
            group_id: group_id.to_string(),
            decision_status: decision,
            risk_level,
            confidence,
            reason_codes,
            fail_actions,
            trace,
            evidence_refs,
            created_by: self.actor.clone(),
            created_at: Utc::now(),
        }
    }

    fn policy_ref(&self) -> PolicyRef {
        PolicyRef {
            policy_id: self.policy.meta.policy_id.clone(),
            policy_version: self.policy.meta.version.clone(),
        }
    }

    /// Best-effort audit emission; failures are logged, never propagated.
    fn emit(&self, event: AuditEvent) {
        if let Err(err) = self.audit.emit(&event) {
            warn!(
                event_type = %event.event_type,
                case_id = %event.case_id,
                error = %err,
                "audit emit failed, continuing"
            );
        }
    }
}
