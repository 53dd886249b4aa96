use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured audit event, one per pipeline state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub case_id: String,
    pub event_type: AuditEventType,
    pub actor: String,
    #[serde(default)]
    pub run_id: Option<String>,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        case_id: &str,
        event_type: AuditEventType,
        actor: &str,
        run_id: Option<&str>,
        payload: serde_json::Value,
    ) -> Self {
        AuditEvent {
            case_id: case_id.to_string(),
            event_type,
            actor: actor.to_string(),
            run_id: run_id.map(str::to_string),
            payload,
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    DecisionRunStarted,
    GroupEvalStarted,
    BaselineSelected,
    RuleFailed,
    GroupDecisionFinalized,
    DecisionRunDone,
    DecisionRunFailed,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::DecisionRunStarted => "DECISION_RUN_STARTED",
            AuditEventType::GroupEvalStarted => "GROUP_EVAL_STARTED",
            AuditEventType::BaselineSelected => "BASELINE_SELECTED",
            AuditEventType::RuleFailed => "RULE_FAILED",
            AuditEventType::GroupDecisionFinalized => "GROUP_DECISION_FINALIZED",
            AuditEventType::DecisionRunDone => "DECISION_RUN_DONE",
            AuditEventType::DecisionRunFailed => "DECISION_RUN_FAILED",
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
