use serde::{Deserialize, Serialize};

/// Synthetic technique selected when no baseline technique passes, or when the
/// group key is UNGROUPED. Always "passes" with no baseline.
pub const FALLBACK_TECHNIQUE: &str = "T_NO_BASELINE_ESCALATE";

/// One entry in a domain's baseline chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technique {
    pub id: String,
    #[serde(default)]
    pub category: TechniqueCategory,
    /// Fact types that must exist on the group before the technique is tried.
    #[serde(default)]
    pub required_facts: Vec<String>,
    #[serde(default)]
    pub gates: Gates,
    /// Present on BASELINE techniques: how to derive the baseline value.
    #[serde(default)]
    pub derive: Option<DeriveSpec>,
}

impl Technique {
    pub fn is_baseline(&self) -> bool {
        self.category == TechniqueCategory::Baseline
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechniqueCategory {
    Baseline,
    /// Non-deriving technique: may pass without producing a baseline.
    #[default]
    Signal,
}

/// Preconditions a technique must satisfy before it may derive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Gates {
    /// Require a resolved group currency. Must not depend on the PO line.
    #[serde(default)]
    pub currency_match: bool,
    #[serde(default)]
    pub min_confidence: Option<MinConfidenceGate>,
}

/// The best (max) confidence among evidences of `evidence_type` must reach
/// `threshold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinConfidenceGate {
    #[serde(default = "default_evidence_type")]
    pub evidence_type: String,
    pub threshold: f64,
}

fn default_evidence_type() -> String {
    "PRICE".to_string()
}

/// How a BASELINE technique turns a fact into a baseline value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeriveSpec {
    /// Fact type the baseline price/currency is read from.
    pub baseline_from: String,
    /// When set, the fact's `value_json.method` must equal this.
    #[serde(default)]
    pub method_required: Option<String>,
}
