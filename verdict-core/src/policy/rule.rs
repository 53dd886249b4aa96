use serde::{Deserialize, Serialize};

/// The severity lattice: LOW < MED < HIGH < CRITICAL.
/// Doubles as the risk-level type for groups, runs, and cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Med,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Med => "MED",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One policy rule, evaluated per group during a decision run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: String,
    #[serde(default)]
    pub group: Option<String>,
    pub severity: Severity,
    #[serde(default)]
    pub preconditions: Preconditions,
    pub logic: RuleLogic,
    #[serde(default)]
    pub fail_actions: Vec<FailAction>,
    #[serde(default)]
    pub explanation: Explanation,
}

/// Applicability gates. A rule whose preconditions do not hold is omitted
/// from the trace entirely — "not applicable" is distinct from "failed".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preconditions {
    #[serde(default)]
    pub baseline_available: Option<bool>,
    /// Baseline must have been derived from this fact type.
    #[serde(default)]
    pub baseline_source: Option<String>,
    /// All of these artifact kinds must be present on the case.
    #[serde(default)]
    pub artifacts_present: Vec<String>,
    /// This artifact kind must be absent.
    #[serde(default)]
    pub artifact_missing: Option<String>,
}

impl Preconditions {
    pub fn is_empty(&self) -> bool {
        self.baseline_available.is_none()
            && self.baseline_source.is_none()
            && self.artifacts_present.is_empty()
            && self.artifact_missing.is_none()
    }
}

/// Rule logic kinds. New kinds are added as variants with a dedicated
/// evaluator; unrecognized types deserialize to [`RuleLogic::Unknown`] and
/// fail closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleLogic {
    /// FAIL when `(po - baseline) / baseline` exceeds `threshold`.
    VariancePct { threshold: f64 },
    /// FAIL when the PO price strictly exceeds the baseline price.
    GreaterThan,
    /// FAIL when a required document kind has no confirmed link.
    DocumentPresence {
        #[serde(default)]
        required_docs: Vec<String>,
    },
    ThreeWayMatch,
    TwoWayMatch,
    DuplicatePattern,
    #[serde(other)]
    Unknown,
}

/// Action attached to a failing rule (e.g. `{"type": "REVIEW"}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailAction {
    #[serde(rename = "type")]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl FailAction {
    pub fn review() -> Self {
        FailAction {
            action: "REVIEW".to_string(),
            value: None,
        }
    }
}

/// Human-readable rule explanations carried into the trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    #[serde(default)]
    pub exec: Option<String>,
    #[serde(default)]
    pub audit: Option<String>,
}
