use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::{Explanation, FailAction, Formula, Severity};

use super::evidence::AnchorType;
use super::line_item::LineItem;
use super::selection::{Baseline, BaselineSource, EvidenceRefs, ReadinessFlags};

/// Lifecycle state of a decision run. Created STARTED, transitions exactly
/// once to COMPLETED or FAILED, never resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Started,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Started => "STARTED",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Failed => "FAILED",
        }
    }
}

/// Per-group decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupDecision {
    Pass,
    Review,
    Reject,
}

/// Case/run-level decision. Group PASS rolls up to APPROVE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunDecision {
    Approve,
    Review,
    Reject,
}

impl RunDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunDecision::Approve => "APPROVE",
            RunDecision::Review => "REVIEW",
            RunDecision::Reject => "REJECT",
        }
    }
}

/// One execution of the decision pipeline over a case. The run row is the
/// permanent record of both success and failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRun {
    pub run_id: String,
    pub case_id: String,
    pub policy_id: String,
    pub policy_version: String,
    pub run_status: RunStatus,
    /// SHA-256 over canonical JSON of (case, policy, selection summary).
    pub input_hash: String,
    pub inputs_snapshot: serde_json::Value,
    /// Set only on completion.
    #[serde(default)]
    pub decision: Option<RunDecision>,
    #[serde(default)]
    pub risk_level: Option<Severity>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub summary: Option<serde_json::Value>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// One group's decision within a run. Unique on `(run_id, group_id)`;
/// immutable once the run completes — a re-run writes new rows under a new
/// `run_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResult {
    pub result_id: String,
    pub run_id: String,
    pub group_id: String,
    pub decision_status: GroupDecision,
    pub risk_level: Severity,
    pub confidence: f64,
    pub reason_codes: Vec<String>,
    pub fail_actions: Vec<FailAction>,
    pub trace: GroupTrace,
    pub evidence_refs: EvidenceRefs,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// PASS/FAIL outcome of one applicable rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleResult {
    Pass,
    Fail,
}

/// Structured trace for one applicable rule. Rules whose preconditions do
/// not hold are omitted, not marked FAIL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTrace {
    pub rule_id: String,
    #[serde(default)]
    pub group: Option<String>,
    pub severity: Severity,
    pub result: RuleResult,
    pub calculation: serde_json::Value,
    pub fail_actions: Vec<FailAction>,
    pub explanation: Explanation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl RuleTrace {
    pub fn failed(&self) -> bool {
        self.result == RuleResult::Fail
    }
}

/// Policy identity snapshot embedded in every trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRef {
    pub policy_id: String,
    pub policy_version: String,
}

/// Full audit trace persisted with each group result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTrace {
    pub policy: PolicyRef,
    pub inputs: TraceInputs,
    #[serde(default)]
    pub selection: Option<TraceSelection>,
    #[serde(default)]
    pub calculations: CalcSection,
    pub rules: Vec<RuleTrace>,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceInputs {
    pub group_id: String,
    #[serde(default)]
    pub anchor_type: Option<AnchorType>,
    #[serde(default)]
    pub anchor_id: Option<String>,
    pub po_line_found: bool,
    pub artifacts_present: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_item: Option<LineItem>,
}

/// Selection inputs echoed into the decision trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSelection {
    pub selected_technique: String,
    #[serde(default)]
    pub baseline: Option<Baseline>,
    #[serde(default)]
    pub baseline_source: Option<BaselineSource>,
    pub readiness_flags: ReadinessFlags,
    #[serde(default)]
    pub selection_refs: EvidenceRefs,
}

/// Calculation outputs and step trace for one group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalcSection {
    #[serde(default)]
    pub values: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub trace: Vec<CalcStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalcStatus {
    Ok,
    Skipped,
    Error,
}

/// Audit record for one calculation step, kept whether or not it produced a
/// value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcStep {
    pub calc_key: String,
    pub formula: Formula,
    /// Input name → resolved value (with the `$`-ref it came from, if any).
    pub inputs: BTreeMap<String, CalcInputTrace>,
    pub output_field: String,
    pub status: CalcStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcInputTrace {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub value: serde_json::Value,
}

/// Per-group summary returned by the runner and consumed by aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub group_id: String,
    pub decision: GroupDecision,
    pub risk_level: Severity,
    pub confidence: f64,
}

/// Final outcome of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: String,
    pub case_id: String,
    pub domain: String,
    pub decision: RunDecision,
    pub risk_level: Severity,
    pub confidence: f64,
    pub groups: Vec<GroupOutcome>,
}
