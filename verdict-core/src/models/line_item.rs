use serde::{Deserialize, Serialize};

/// An immutable PO line-item snapshot, keyed by `item_id`.
/// The PO line is context for a group, never the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: String,
    pub case_id: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub uom: Option<String>,
    #[serde(default)]
    pub source_line_ref: Option<String>,
}
