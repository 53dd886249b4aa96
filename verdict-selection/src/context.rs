//! Group context: everything a technique evaluation may read,
//! materialized once per group.

use std::collections::{BTreeMap, HashMap};

use verdict_core::models::{AnchorType, Evidence, EvidenceGroup, Fact, LineItem};

/// Read-only evaluation context for one evidence group.
pub struct GroupContext {
    pub domain: String,
    pub group_id: String,
    pub group_key: Option<String>,
    pub anchor_type: Option<AnchorType>,
    pub anchor_id: Option<String>,
    /// PO line resolved via the group's anchor. Optional context only —
    /// selection never treats it as the anchor of truth.
    pub po_line: Option<LineItem>,
    pub evidences: Vec<Evidence>,
    /// Facts indexed by `fact_type`; owned by this group alone.
    pub facts: BTreeMap<String, Fact>,
    /// Resolved currency. Precedence: PO line → facts → policy default.
    pub currency: String,
}

impl GroupContext {
    pub fn build(
        domain_code: &str,
        group: &EvidenceGroup,
        po_by_item_id: &HashMap<String, LineItem>,
        facts: Vec<Fact>,
        evidences: Vec<Evidence>,
        currency_default: &str,
    ) -> Self {
        // PO context resolves only through the anchor item id.
        let po_line = match (&group.anchor_type, &group.anchor_id) {
            (Some(AnchorType::PoItem), Some(anchor_id)) => po_by_item_id.get(anchor_id).cloned(),
            _ => None,
        };

        let fact_currency = facts
            .iter()
            .find_map(|f| f.value_json.currency.clone());

        let currency = po_line
            .as_ref()
            .and_then(|l| l.currency.clone())
            .or(fact_currency)
            .unwrap_or_else(|| currency_default.to_string());

        let fact_map = facts
            .into_iter()
            .map(|f| (f.fact_type.clone(), f))
            .collect();

        GroupContext {
            domain: domain_code.to_string(),
            group_id: group.group_id.clone(),
            group_key: group.group_key.clone(),
            anchor_type: group.anchor_type,
            anchor_id: group.anchor_id.clone(),
            po_line,
            evidences,
            facts: fact_map,
            currency,
        }
    }

    pub fn has_currency(&self) -> bool {
        !self.currency.is_empty()
    }
}
