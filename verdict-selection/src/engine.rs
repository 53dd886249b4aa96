//! SelectionEngine — walks each domain's baseline-priority chain per group,
//! gates techniques on required facts / currency / evidence confidence, and
//! derives the baseline from the winning technique's named fact.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use verdict_core::errors::VerdictResult;
use verdict_core::models::{
    Baseline, BaselineSource, CaseSelection, EvidenceRefs, ReadinessFlags, SelectionResult,
    TechniqueAttempt,
};
use verdict_core::policy::{DomainProfile, PolicyBundle, Technique, FALLBACK_TECHNIQUE};
use verdict_core::traits::{EvidenceGroupStore, EvidenceStore, FactStore, LineItemStore};

use crate::context::GroupContext;

/// Deterministic baseline selection over a case's evidence groups.
pub struct SelectionEngine {
    policy: Arc<PolicyBundle>,
    groups: Arc<dyn EvidenceGroupStore>,
    facts: Arc<dyn FactStore>,
    evidence: Arc<dyn EvidenceStore>,
    line_items: Arc<dyn LineItemStore>,
}

impl SelectionEngine {
    pub fn new(
        policy: Arc<PolicyBundle>,
        groups: Arc<dyn EvidenceGroupStore>,
        facts: Arc<dyn FactStore>,
        evidence: Arc<dyn EvidenceStore>,
        line_items: Arc<dyn LineItemStore>,
    ) -> Self {
        SelectionEngine {
            policy,
            groups,
            facts,
            evidence,
            line_items,
        }
    }

    /// Select a baseline technique for every group in the case.
    pub fn select_for_case(&self, case_id: &str, domain_code: &str) -> VerdictResult<CaseSelection> {
        let domain = self.policy.domain(domain_code)?;

        let po_by_item_id: HashMap<String, _> = self
            .line_items
            .list_line_items(case_id)?
            .into_iter()
            .map(|l| (l.item_id.clone(), l))
            .collect();

        let groups = self.groups.list_groups(case_id)?;
        let mut results = Vec::with_capacity(groups.len());

        for group in &groups {
            let facts = self.facts.list_facts(&group.group_id)?;
            let evidences = self.evidence.list_evidence(&group.group_id)?;
            let ctx = GroupContext::build(
                domain_code,
                group,
                &po_by_item_id,
                facts,
                evidences,
                &self.policy.meta.currency_default,
            );
            results.push(self.select_for_group(&ctx, domain));
        }

        Ok(CaseSelection {
            case_id: case_id.to_string(),
            domain: domain_code.to_string(),
            groups: results,
        })
    }

    fn select_for_group(&self, ctx: &GroupContext, domain: &DomainProfile) -> SelectionResult {
        let mut trace: Vec<TechniqueAttempt> = Vec::new();

        // UNGROUPED never attempts baselines. Fixed rule, not a shortcut.
        if ctx.group_key.as_deref() == Some(verdict_core::models::UNGROUPED_KEY) {
            let fallback = fallback_attempt();
            trace.push(fallback.clone());
            return build_result(ctx, &fallback, trace);
        }

        let mut selected: Option<TechniqueAttempt> = None;
        for tech_id in &domain.baseline_priority {
            let Some(tech) = domain.techniques.get(tech_id) else {
                continue;
            };
            let attempt = evaluate_technique(ctx, tech);
            trace.push(attempt.clone());
            if attempt.passed {
                debug!(group_id = %ctx.group_id, technique = %tech_id, "baseline technique passed");
                selected = Some(attempt);
                // First pass wins; later techniques are never evaluated.
                break;
            }
        }

        let selected = selected.unwrap_or_else(|| {
            let fallback = fallback_attempt();
            trace.push(fallback.clone());
            fallback
        });

        build_result(ctx, &selected, trace)
    }
}

fn build_result(
    ctx: &GroupContext,
    selected: &TechniqueAttempt,
    trace: Vec<TechniqueAttempt>,
) -> SelectionResult {
    SelectionResult {
        group_id: ctx.group_id.clone(),
        group_key: ctx.group_key.clone(),
        selected_technique: selected.technique_id.clone(),
        baseline: selected.baseline.clone(),
        baseline_source: selected.baseline_source.clone(),
        readiness_flags: ReadinessFlags {
            baseline_available: selected.baseline.is_some(),
            evidence_present: !ctx.evidences.is_empty(),
            currency_present: ctx.has_currency(),
            po_line_found: ctx.po_line.is_some(),
        },
        selection_trace: trace,
    }
}

fn evaluate_technique(ctx: &GroupContext, tech: &Technique) -> TechniqueAttempt {
    for fact_type in &tech.required_facts {
        if !ctx.facts.contains_key(fact_type) {
            return failed_attempt(&tech.id, vec![format!("MISSING_FACT:{fact_type}")]);
        }
    }

    let gate_errors = check_gates(ctx, tech);
    if !gate_errors.is_empty() {
        return failed_attempt(&tech.id, gate_errors);
    }

    if tech.is_baseline() {
        return derive_baseline(ctx, tech);
    }

    // Signal technique: passes without deriving a baseline.
    TechniqueAttempt {
        technique_id: tech.id.clone(),
        passed: true,
        baseline: None,
        baseline_source: None,
        fail_reasons: vec![],
        references: EvidenceRefs::default(),
    }
}

fn check_gates(ctx: &GroupContext, tech: &Technique) -> Vec<String> {
    let mut errors = Vec::new();

    // Currency gate must not depend on the PO line; the context already
    // resolved currency with PO → facts → policy-default precedence.
    if tech.gates.currency_match && !ctx.has_currency() {
        errors.push("CURRENCY_MISSING".to_string());
    }

    if let Some(gate) = &tech.gates.min_confidence {
        let best = ctx
            .evidences
            .iter()
            .filter(|e| e.evidence_type == gate.evidence_type)
            .map(|e| e.confidence.unwrap_or(0.0))
            .fold(None::<f64>, |acc, c| Some(acc.map_or(c, |a| a.max(c))));

        match best {
            None => errors.push(format!("MISSING_EVIDENCE:{}", gate.evidence_type)),
            Some(confidence) if confidence < gate.threshold => {
                errors.push(format!("EVIDENCE_CONFIDENCE_BELOW_THRESHOLD:{confidence}"));
            }
            Some(_) => {}
        }
    }

    errors
}

fn derive_baseline(ctx: &GroupContext, tech: &Technique) -> TechniqueAttempt {
    // Validation guarantees BASELINE techniques carry a derive spec.
    let Some(derive) = &tech.derive else {
        return failed_attempt(&tech.id, vec!["DERIVE_SPEC_MISSING".to_string()]);
    };

    let Some(fact) = ctx.facts.get(&derive.baseline_from) else {
        return failed_attempt(&tech.id, vec![format!("MISSING_FACT:{}", derive.baseline_from)]);
    };

    let Some(price) = fact.value_json.price else {
        return failed_attempt(&tech.id, vec!["PRICE_VALUE_MISSING".to_string()]);
    };

    if let Some(required) = &derive.method_required {
        if fact.value_json.method.as_deref() != Some(required.as_str()) {
            return failed_attempt(&tech.id, vec!["FACT_METHOD_MISMATCH".to_string()]);
        }
    }

    let currency = fact
        .value_json
        .currency
        .clone()
        .or_else(|| (!ctx.currency.is_empty()).then(|| ctx.currency.clone()));

    TechniqueAttempt {
        technique_id: tech.id.clone(),
        passed: true,
        baseline: Some(Baseline {
            value: price,
            currency,
        }),
        baseline_source: Some(BaselineSource {
            fact_type: derive.baseline_from.clone(),
            method: fact.value_json.method.clone(),
        }),
        fail_reasons: vec![],
        references: EvidenceRefs {
            fact_ids: vec![fact.fact_id.clone()],
            evidence_ids: fact.source_evidence_ids.clone(),
        },
    }
}

fn fallback_attempt() -> TechniqueAttempt {
    TechniqueAttempt {
        technique_id: FALLBACK_TECHNIQUE.to_string(),
        passed: true,
        baseline: None,
        baseline_source: None,
        fail_reasons: vec![],
        references: EvidenceRefs::default(),
    }
}

fn failed_attempt(technique_id: &str, fail_reasons: Vec<String>) -> TechniqueAttempt {
    TechniqueAttempt {
        technique_id: technique_id.to_string(),
        passed: false,
        baseline: None,
        baseline_source: None,
        fail_reasons,
        references: EvidenceRefs::default(),
    }
}
