//! Builders for policy bundles and case data used across crate tests.

use verdict_core::models::{
    AnchorType, DocumentLink, Evidence, EvidenceGroup, Fact, FactValue, LineItem, LinkStatus,
    UNGROUPED_KEY,
};
use verdict_core::policy::{self, PolicyBundle};

/// A small procurement policy: contract price first, catalog price second,
/// a variance rule, a price-ceiling rule, and a contract-presence rule.
pub fn sample_policy() -> PolicyBundle {
    policy::from_json_str(
        r#"{
          "meta": {
            "policy_id": "sense_policy_mvp",
            "version": "1.0.0",
            "currency_default": "THB",
            "rounding": {"pct_decimals": 2}
          },
          "domains": {
            "procurement": {
              "baseline_priority": ["T_CONTRACT_PRICE", "T_CATALOG_PRICE"],
              "techniques": {
                "T_CONTRACT_PRICE": {
                  "id": "T_CONTRACT_PRICE",
                  "category": "BASELINE",
                  "required_facts": ["CONTRACT_PRICE"],
                  "gates": {"currency_match": true},
                  "derive": {"baseline_from": "CONTRACT_PRICE", "method_required": "PER_SKU"}
                },
                "T_CATALOG_PRICE": {
                  "id": "T_CATALOG_PRICE",
                  "category": "BASELINE",
                  "required_facts": ["CATALOG_PRICE"],
                  "gates": {"min_confidence": {"evidence_type": "PRICE", "threshold": 0.6}},
                  "derive": {"baseline_from": "CATALOG_PRICE"}
                }
              },
              "rules": [
                {
                  "rule_id": "R_PRICE_VARIANCE",
                  "severity": "MED",
                  "preconditions": {"baseline_available": true},
                  "logic": {"type": "variance_pct", "threshold": 0.05},
                  "fail_actions": [{"type": "REVIEW"}],
                  "explanation": {
                    "exec": "PO price deviates from baseline beyond tolerance",
                    "audit": "variance_pct exceeded policy threshold"
                  }
                },
                {
                  "rule_id": "R_PO_OVER_BASELINE",
                  "severity": "HIGH",
                  "preconditions": {"baseline_available": true},
                  "logic": {"type": "greater_than"},
                  "fail_actions": [{"type": "REVIEW"}]
                },
                {
                  "rule_id": "R_CONTRACT_PRESENT",
                  "severity": "HIGH",
                  "preconditions": {"artifacts_present": ["PO"]},
                  "logic": {"type": "document_presence", "required_docs": ["CONTRACT"]},
                  "fail_actions": [{"type": "REVIEW"}]
                }
              ],
              "calculations": {
                "variance_pct": {
                  "formula": "PCT_DIFF",
                  "inputs": {
                    "po_unit_price_value": "$po.unit_price.value",
                    "baseline_price_value": "$selection.baseline.value"
                  },
                  "guards": [
                    {"not_null": ["po_unit_price_value", "baseline_price_value"]},
                    {"non_zero": ["baseline_price_value"]}
                  ],
                  "output": {"field": "variance_pct", "decimals": 2}
                }
              }
            }
          }
        }"#,
    )
    .expect("sample policy must parse")
}

pub fn group(case_id: &str, group_id: &str, anchor_id: &str, group_key: &str) -> EvidenceGroup {
    EvidenceGroup {
        group_id: group_id.to_string(),
        case_id: case_id.to_string(),
        anchor_type: Some(AnchorType::PoItem),
        anchor_id: Some(anchor_id.to_string()),
        group_key: Some(group_key.to_string()),
        evidence_ids: vec![],
    }
}

pub fn ungrouped_group(case_id: &str, group_id: &str) -> EvidenceGroup {
    EvidenceGroup {
        group_id: group_id.to_string(),
        case_id: case_id.to_string(),
        anchor_type: Some(AnchorType::PoItem),
        anchor_id: None,
        group_key: Some(UNGROUPED_KEY.to_string()),
        evidence_ids: vec![],
    }
}

pub fn line_item(case_id: &str, item_id: &str, unit_price: f64, currency: &str) -> LineItem {
    LineItem {
        item_id: item_id.to_string(),
        case_id: case_id.to_string(),
        sku: Some(format!("SKU-{item_id}")),
        item_name: Some(format!("Item {item_id}")),
        quantity: Some(1.0),
        unit_price: Some(unit_price),
        currency: Some(currency.to_string()),
        total_price: Some(unit_price),
        uom: Some("EA".to_string()),
        source_line_ref: None,
    }
}

pub fn price_fact(
    group_id: &str,
    fact_type: &str,
    price: f64,
    currency: &str,
    method: Option<&str>,
) -> Fact {
    Fact {
        fact_id: format!("fact-{group_id}-{fact_type}"),
        group_id: group_id.to_string(),
        fact_type: fact_type.to_string(),
        value: None,
        value_json: FactValue {
            price: Some(price),
            currency: Some(currency.to_string()),
            method: method.map(str::to_string),
        },
        confidence: Some(0.9),
        source_evidence_ids: vec![format!("ev-{group_id}-1")],
    }
}

pub fn evidence(group_id: &str, evidence_type: &str, confidence: f64) -> Evidence {
    Evidence {
        evidence_id: format!("ev-{group_id}-{evidence_type}"),
        group_id: group_id.to_string(),
        evidence_type: evidence_type.to_string(),
        confidence: Some(confidence),
    }
}

pub fn confirmed_link(document_id: &str) -> DocumentLink {
    DocumentLink {
        document_id: document_id.to_string(),
        link_status: LinkStatus::Confirmed,
    }
}
