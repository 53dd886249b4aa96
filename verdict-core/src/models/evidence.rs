use serde::{Deserialize, Serialize};

/// Group key marking evidence that could not be matched to any line item.
/// UNGROUPED groups deterministically skip all baseline techniques.
pub const UNGROUPED_KEY: &str = "UNGROUPED";

/// The unit of decisioning: one group per PO line item, aggregating the facts
/// and evidence evaluated independently of every other group. Groups are
/// created once and never deleted, only re-read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceGroup {
    pub group_id: String,
    pub case_id: String,
    #[serde(default)]
    pub anchor_type: Option<AnchorType>,
    /// Line item id the group is anchored to.
    #[serde(default)]
    pub anchor_id: Option<String>,
    #[serde(default)]
    pub group_key: Option<String>,
    #[serde(default)]
    pub evidence_ids: Vec<String>,
}

impl EvidenceGroup {
    pub fn is_ungrouped(&self) -> bool {
        self.group_key.as_deref() == Some(UNGROUPED_KEY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnchorType {
    PoItem,
}

/// A piece of extracted evidence attached to a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_id: String,
    pub group_id: String,
    /// e.g. "PRICE", "CLAUSE".
    pub evidence_type: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// A case-level document link; only confirmed links count as artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLink {
    pub document_id: String,
    pub link_status: LinkStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    Confirmed,
    Pending,
    Rejected,
}
