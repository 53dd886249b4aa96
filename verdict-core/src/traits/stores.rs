use serde_json::Value;

use crate::errors::VerdictResult;
use crate::models::{
    DecisionResult, DecisionRun, DocumentLink, Evidence, EvidenceGroup, Fact, LineItem,
    RunDecision,
};
use crate::policy::Severity;

/// Read access to facts. Facts are owned by `group_id` only.
pub trait FactStore: Send + Sync {
    fn list_facts(&self, group_id: &str) -> VerdictResult<Vec<Fact>>;
}

/// Read access to evidence rows, again keyed by group.
pub trait EvidenceStore: Send + Sync {
    fn list_evidence(&self, group_id: &str) -> VerdictResult<Vec<Evidence>>;
}

/// Read access to a case's evidence groups.
pub trait EvidenceGroupStore: Send + Sync {
    fn list_groups(&self, case_id: &str) -> VerdictResult<Vec<EvidenceGroup>>;
}

/// Read access to the immutable PO line-item snapshot of a case.
pub trait LineItemStore: Send + Sync {
    fn list_line_items(&self, case_id: &str) -> VerdictResult<Vec<LineItem>>;
}

/// Confirmed document links, used only to derive the artifacts-present set.
pub trait DocumentLinkStore: Send + Sync {
    fn list_confirmed_links(&self, case_id: &str) -> VerdictResult<Vec<DocumentLink>>;
}

/// Lifecycle writes and replay reads for decision runs.
pub trait DecisionRunStore: Send + Sync {
    fn create_run(&self, run: &DecisionRun) -> VerdictResult<()>;

    /// STARTED → COMPLETED. Any other source state is an invalid transition.
    fn complete_run(
        &self,
        run_id: &str,
        decision: RunDecision,
        risk_level: Severity,
        confidence: f64,
        summary: &Value,
    ) -> VerdictResult<()>;

    /// STARTED → FAILED, recording the error string in the summary.
    fn fail_run(&self, run_id: &str, error: &str) -> VerdictResult<()>;

    fn get_run(&self, run_id: &str) -> VerdictResult<Option<DecisionRun>>;

    fn get_latest_completed(&self, case_id: &str) -> VerdictResult<Option<DecisionRun>>;
}

/// Per-group result rows, unique on `(run_id, group_id)`.
pub trait DecisionResultStore: Send + Sync {
    /// Idempotent per group: retrying a partial failure re-writes the same
    /// row with the latest values.
    fn upsert_result(&self, result: &DecisionResult) -> VerdictResult<()>;

    fn list_by_run(&self, run_id: &str) -> VerdictResult<Vec<DecisionResult>>;
}
