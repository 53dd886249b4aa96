//! In-memory store implementations. Case data stores are plain vectors (the
//! engine only reads them); run/result stores and the audit sink are
//! mutex-guarded so tests can exercise concurrent group evaluation.

use std::sync::Mutex;

use chrono::Utc;
use serde_json::Value;

use verdict_core::errors::{StoreError, VerdictResult};
use verdict_core::models::{
    AuditEvent, DecisionResult, DecisionRun, DocumentLink, Evidence, EvidenceGroup, Fact,
    LineItem, LinkStatus, RunDecision, RunStatus,
};
use verdict_core::policy::Severity;
use verdict_core::traits::{
    AuditSink, DecisionResultStore, DecisionRunStore, DocumentLinkStore, EvidenceGroupStore,
    EvidenceStore, FactStore, LineItemStore,
};

/// All read-only case inputs in one fixture.
#[derive(Default)]
pub struct InMemoryCaseStore {
    pub groups: Vec<EvidenceGroup>,
    pub facts: Vec<Fact>,
    pub evidence: Vec<Evidence>,
    pub line_items: Vec<LineItem>,
    /// (case_id, link) pairs; only CONFIRMED links are served.
    pub links: Vec<(String, DocumentLink)>,
}

impl FactStore for InMemoryCaseStore {
    fn list_facts(&self, group_id: &str) -> VerdictResult<Vec<Fact>> {
        Ok(self
            .facts
            .iter()
            .filter(|f| f.group_id == group_id)
            .cloned()
            .collect())
    }
}

impl EvidenceStore for InMemoryCaseStore {
    fn list_evidence(&self, group_id: &str) -> VerdictResult<Vec<Evidence>> {
        Ok(self
            .evidence
            .iter()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect())
    }
}

impl EvidenceGroupStore for InMemoryCaseStore {
    fn list_groups(&self, case_id: &str) -> VerdictResult<Vec<EvidenceGroup>> {
        Ok(self
            .groups
            .iter()
            .filter(|g| g.case_id == case_id)
            .cloned()
            .collect())
    }
}

impl LineItemStore for InMemoryCaseStore {
    fn list_line_items(&self, case_id: &str) -> VerdictResult<Vec<LineItem>> {
        Ok(self
            .line_items
            .iter()
            .filter(|l| l.case_id == case_id)
            .cloned()
            .collect())
    }
}

impl DocumentLinkStore for InMemoryCaseStore {
    fn list_confirmed_links(&self, case_id: &str) -> VerdictResult<Vec<DocumentLink>> {
        Ok(self
            .links
            .iter()
            .filter(|(c, l)| c == case_id && l.link_status == LinkStatus::Confirmed)
            .map(|(_, l)| l.clone())
            .collect())
    }
}

/// Mutex-guarded run store enforcing STARTED → COMPLETED/FAILED transitions.
#[derive(Default)]
pub struct InMemoryRunStore {
    pub runs: Mutex<Vec<DecisionRun>>,
}

impl InMemoryRunStore {
    /// Panicking lookup for assertions.
    pub fn get_run_by_id(&self, run_id: &str) -> DecisionRun {
        self.runs
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.run_id == run_id)
            .cloned()
            .expect("run exists")
    }

    pub fn get_latest_completed_for(&self, case_id: &str) -> Option<DecisionRun> {
        self.runs
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.case_id == case_id && r.run_status == RunStatus::Completed)
            .max_by_key(|r| r.completed_at)
            .cloned()
    }

    fn transition(
        &self,
        run_id: &str,
        to: RunStatus,
        apply: impl FnOnce(&mut DecisionRun),
    ) -> VerdictResult<()> {
        let mut runs = self.runs.lock().unwrap();
        let run = runs
            .iter_mut()
            .find(|r| r.run_id == run_id)
            .ok_or_else(|| StoreError::RunNotFound {
                run_id: run_id.to_string(),
            })?;
        if run.run_status != RunStatus::Started {
            return Err(StoreError::InvalidTransition {
                run_id: run_id.to_string(),
                from: run.run_status.as_str().to_string(),
                to: to.as_str().to_string(),
            }
            .into());
        }
        run.run_status = to;
        run.completed_at = Some(Utc::now());
        apply(run);
        Ok(())
    }
}

impl DecisionRunStore for InMemoryRunStore {
    fn create_run(&self, run: &DecisionRun) -> VerdictResult<()> {
        self.runs.lock().unwrap().push(run.clone());
        Ok(())
    }

    fn complete_run(
        &self,
        run_id: &str,
        decision: RunDecision,
        risk_level: Severity,
        confidence: f64,
        summary: &Value,
    ) -> VerdictResult<()> {
        self.transition(run_id, RunStatus::Completed, |run| {
            run.decision = Some(decision);
            run.risk_level = Some(risk_level);
            run.confidence = Some(confidence);
            run.summary = Some(summary.clone());
        })
    }

    fn fail_run(&self, run_id: &str, error: &str) -> VerdictResult<()> {
        let summary = serde_json::json!({ "error": error });
        self.transition(run_id, RunStatus::Failed, |run| {
            run.summary = Some(summary);
        })
    }

    fn get_run(&self, run_id: &str) -> VerdictResult<Option<DecisionRun>> {
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.run_id == run_id)
            .cloned())
    }

    fn get_latest_completed(&self, case_id: &str) -> VerdictResult<Option<DecisionRun>> {
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.case_id == case_id && r.run_status == RunStatus::Completed)
            .max_by_key(|r| r.completed_at)
            .cloned())
    }
}

/// Mutex-guarded result store with (run_id, group_id) upsert semantics.
#[derive(Default)]
pub struct InMemoryResultStore {
    pub rows: Mutex<Vec<DecisionResult>>,
}

impl DecisionResultStore for InMemoryResultStore {
    fn upsert_result(&self, result: &DecisionResult) -> VerdictResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows
            .iter_mut()
            .find(|r| r.run_id == result.run_id && r.group_id == result.group_id)
        {
            *existing = result.clone();
        } else {
            rows.push(result.clone());
        }
        Ok(())
    }

    fn list_by_run(&self, run_id: &str) -> VerdictResult<Vec<DecisionResult>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.run_id == run_id)
            .cloned()
            .collect())
    }
}

/// Records every emitted event for assertions.
#[derive(Default)]
pub struct MemoryAuditSink {
    pub events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type.as_str().to_string())
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: &AuditEvent) -> VerdictResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Always-failing sink, for asserting audit failures never abort a run.
pub struct FailingAuditSink;

impl AuditSink for FailingAuditSink {
    fn emit(&self, _event: &AuditEvent) -> VerdictResult<()> {
        Err(StoreError::AuditUnavailable {
            reason: "fixture sink always fails".to_string(),
        }
        .into())
    }
}
