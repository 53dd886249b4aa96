use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Output of Technical Selection for one case + domain.
/// The decision run consumes this verbatim; baselines are never re-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSelection {
    pub case_id: String,
    pub domain: String,
    pub groups: Vec<SelectionResult>,
}

impl CaseSelection {
    /// Compact summary used in run snapshots and the input hash.
    pub fn summary(&self) -> SelectionSummary {
        let mut technique_counts: BTreeMap<String, usize> = BTreeMap::new();
        for g in &self.groups {
            *technique_counts
                .entry(g.selected_technique.clone())
                .or_insert(0) += 1;
        }
        SelectionSummary {
            case_id: self.case_id.clone(),
            domain: self.domain.clone(),
            group_count: self.groups.len(),
            technique_counts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub case_id: String,
    pub domain: String,
    pub group_count: usize,
    pub technique_counts: BTreeMap<String, usize>,
}

/// Per-group selection outcome plus the full attempt trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub group_id: String,
    #[serde(default)]
    pub group_key: Option<String>,
    pub selected_technique: String,
    pub baseline: Option<Baseline>,
    pub baseline_source: Option<BaselineSource>,
    pub readiness_flags: ReadinessFlags,
    /// Every technique attempt in evaluation order, pass or fail.
    /// This is the audit evidence for why a baseline was or wasn't found.
    pub selection_trace: Vec<TechniqueAttempt>,
}

impl SelectionResult {
    /// References from the winning attempt, empty when nothing passed.
    pub fn winning_refs(&self) -> EvidenceRefs {
        self.selection_trace
            .iter()
            .find(|a| a.passed)
            .map(|a| a.references.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub value: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSource {
    pub fact_type: String,
    #[serde(default)]
    pub method: Option<String>,
}

/// Derived readiness signals; never independently sourced, so they are
/// internally consistent with the selection outcome by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessFlags {
    pub baseline_available: bool,
    pub evidence_present: bool,
    pub currency_present: bool,
    /// Audit signal only; selection never depends on the PO line.
    pub po_line_found: bool,
}

/// One evaluated technique in the selection trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechniqueAttempt {
    pub technique_id: String,
    pub passed: bool,
    #[serde(default)]
    pub baseline: Option<Baseline>,
    #[serde(default)]
    pub baseline_source: Option<BaselineSource>,
    #[serde(default)]
    pub fail_reasons: Vec<String>,
    #[serde(default)]
    pub references: EvidenceRefs,
}

/// Provenance references carried from selection into decision results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRefs {
    #[serde(default)]
    pub fact_ids: Vec<String>,
    #[serde(default)]
    pub evidence_ids: Vec<String>,
}
