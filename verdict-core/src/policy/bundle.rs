use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::PolicyError;

use super::{CalcDef, Rule, Technique};

/// The versioned, read-only policy document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyBundle {
    pub meta: PolicyMeta,
    /// Domain code → profile (e.g. "procurement", "finance_ap").
    pub domains: BTreeMap<String, DomainProfile>,
}

/// Policy identity and process-wide defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyMeta {
    pub policy_id: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Currency used when neither the anchor line item nor any fact carries one.
    #[serde(default = "default_currency")]
    pub currency_default: String,
    /// Rounding-key → decimal places for calculation outputs.
    #[serde(default)]
    pub rounding: BTreeMap<String, u32>,
}

fn default_currency() -> String {
    "THB".to_string()
}

/// Per-domain policy: the ordered baseline chain, its techniques, the rule
/// list evaluated during a decision run, and derived-value calculations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainProfile {
    #[serde(default)]
    pub description: Option<String>,
    /// Technique ids tried in order; first pass wins.
    #[serde(default)]
    pub baseline_priority: Vec<String>,
    #[serde(default)]
    pub techniques: BTreeMap<String, Technique>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub calculations: BTreeMap<String, CalcDef>,
}

impl PolicyBundle {
    /// Resolve a domain profile, erroring on unknown domain codes.
    pub fn domain(&self, domain_code: &str) -> Result<&DomainProfile, PolicyError> {
        self.domains
            .get(domain_code)
            .ok_or_else(|| PolicyError::DomainNotFound {
                domain_code: domain_code.to_string(),
            })
    }

    /// Structural validation, run once at the load boundary.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let invalid = |reason: String| PolicyError::Invalid {
            policy_id: self.meta.policy_id.clone(),
            version: self.meta.version.clone(),
            reason,
        };

        if self.meta.policy_id.trim().is_empty() {
            return Err(invalid("meta.policy_id is empty".to_string()));
        }
        if self.meta.version.trim().is_empty() {
            return Err(invalid("meta.version is empty".to_string()));
        }

        for (code, domain) in &self.domains {
            for tech_id in &domain.baseline_priority {
                if !domain.techniques.contains_key(tech_id) {
                    return Err(invalid(format!(
                        "domain {code}: baseline_priority references unknown technique {tech_id}"
                    )));
                }
            }
            for (tech_id, tech) in &domain.techniques {
                if tech.is_baseline() && tech.derive.is_none() {
                    return Err(invalid(format!(
                        "domain {code}: BASELINE technique {tech_id} has no derive spec"
                    )));
                }
                if let Some(gate) = &tech.gates.min_confidence {
                    if !(0.0..=1.0).contains(&gate.threshold) {
                        return Err(invalid(format!(
                            "domain {code}: technique {tech_id} min_confidence threshold out of range"
                        )));
                    }
                }
            }
            let mut seen = std::collections::BTreeSet::new();
            for rule in &domain.rules {
                if !seen.insert(rule.rule_id.as_str()) {
                    return Err(invalid(format!(
                        "domain {code}: duplicate rule_id {}",
                        rule.rule_id
                    )));
                }
            }
        }

        Ok(())
    }
}
