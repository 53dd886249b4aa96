//! Deterministic run-input hashing.
//!
//! `serde_json`'s default `Map` is ordered (BTreeMap-backed), so serializing
//! through `Value` yields key-sorted objects. The hash payload is built as a
//! `Value` rather than a struct to keep the byte representation independent
//! of field declaration order.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::models::SelectionSummary;

/// Hex SHA-256 of arbitrary bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Canonical JSON string of a value: all objects key-sorted, no whitespace.
pub fn canonical_string(value: &Value) -> String {
    canonicalize(value).to_string()
}

/// Rebuild a value with every object's keys in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for k in keys {
                sorted.insert(k.clone(), canonicalize(&map[k]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// The run input hash: SHA-256 over the canonical JSON of
/// `{case_id, policy_id, policy_version, selection_summary}`.
///
/// Identical inputs hash identically across runs; callers use this for
/// idempotency and replay detection.
pub fn input_hash(
    case_id: &str,
    policy_id: &str,
    policy_version: &str,
    summary: &SelectionSummary,
) -> String {
    let mut counts = Map::new();
    for (technique, n) in &summary.technique_counts {
        counts.insert(technique.clone(), Value::from(*n));
    }

    let mut summary_obj = Map::new();
    summary_obj.insert("case_id".to_string(), Value::from(summary.case_id.as_str()));
    summary_obj.insert("domain".to_string(), Value::from(summary.domain.as_str()));
    summary_obj.insert("group_count".to_string(), Value::from(summary.group_count));
    summary_obj.insert("technique_counts".to_string(), Value::Object(counts));

    let mut payload = Map::new();
    payload.insert("case_id".to_string(), Value::from(case_id));
    payload.insert("policy_id".to_string(), Value::from(policy_id));
    payload.insert("policy_version".to_string(), Value::from(policy_version));
    payload.insert("selection_summary".to_string(), Value::Object(summary_obj));

    sha256_hex(canonical_string(&Value::Object(payload)).as_bytes())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    #[test]
    fn canonical_string_sorts_nested_keys() {
        let v = json!({"b": {"z": 1, "a": 2}, "a": [{"y": 1, "x": 2}]});
        assert_eq!(
            canonical_string(&v),
            r#"{"a":[{"x":2,"y":1}],"b":{"a":2,"z":1}}"#
        );
    }

    #[test]
    fn input_hash_is_stable() {
        let summary = SelectionSummary {
            case_id: "case-1".to_string(),
            domain: "procurement".to_string(),
            group_count: 2,
            technique_counts: BTreeMap::from([
                ("T_CONTRACT_PRICE".to_string(), 1),
                ("T_NO_BASELINE_ESCALATE".to_string(), 1),
            ]),
        };
        let h1 = input_hash("case-1", "policy", "1.0.0", &summary);
        let h2 = input_hash("case-1", "policy", "1.0.0", &summary);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);

        let h3 = input_hash("case-1", "policy", "1.0.1", &summary);
        assert_ne!(h1, h3);
    }

    proptest! {
        /// Key insertion order must never change the canonical form.
        #[test]
        fn canonical_form_ignores_insertion_order(
            keys in proptest::collection::btree_set("[a-z]{1,8}", 1..8),
        ) {
            let keys: Vec<String> = keys.into_iter().collect();
            let mut forward = Map::new();
            for (i, k) in keys.iter().enumerate() {
                forward.insert(k.clone(), Value::from(i as u64));
            }
            let mut reverse = Map::new();
            for (i, k) in keys.iter().enumerate().rev() {
                reverse.insert(k.clone(), Value::from(i as u64));
            }
            prop_assert_eq!(
                canonical_string(&Value::Object(forward)),
                canonical_string(&Value::Object(reverse))
            );
        }
    }
}
