use serde::{Deserialize, Serialize};

/// A derived, typed value owned by a single evidence group.
///
/// Facts are keyed by `group_id` only — there is no `case_id + fact_type`
/// lookup anywhere in the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub fact_id: String,
    pub group_id: String,
    /// e.g. "CONTRACT_PRICE", "CATALOG_PRICE".
    pub fact_type: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub value_json: FactValue,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Provenance: evidence rows this fact was derived from.
    #[serde(default)]
    pub source_evidence_ids: Vec<String>,
}

/// Structured fact payload baselines are derived from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactValue {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}
