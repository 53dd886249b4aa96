//! Stateless, deterministic calculation engine driven by
//! `policy.domains.<domain>.calculations`.
//!
//! Inputs resolve against a per-group JSON context via `$`-paths
//! (`$po.unit_price.value`, `$selection.baseline.value`). Guard failures skip
//! a step; compute errors are captured as step notes. Neither ever fails the
//! surrounding run.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use verdict_core::models::{Baseline, CalcInputTrace, CalcSection, CalcStatus, CalcStep, LineItem};
use verdict_core::policy::{CalcDef, Formula, Guard};

/// Build the calculation context for one group.
pub fn build_context(po_line: &LineItem, baseline: Option<&Baseline>) -> Value {
    json!({
        "po": {
            "unit_price": {
                "value": po_line.unit_price,
                "currency": po_line.currency,
            }
        },
        "selection": {
            "baseline": baseline.map(|b| json!({
                "value": b.value,
                "currency": b.currency,
            })),
        },
    })
}

/// Compute every declared calculation, tracing each step.
pub fn compute_all(
    calcs: &BTreeMap<String, CalcDef>,
    ctx: &Value,
    rounding: &BTreeMap<String, u32>,
) -> CalcSection {
    let mut section = CalcSection::default();

    for (calc_key, def) in calcs {
        let output_field = def
            .output
            .field
            .clone()
            .unwrap_or_else(|| calc_key.clone());

        let inputs = resolve_inputs(def, ctx);
        let input_trace = inputs
            .iter()
            .map(|(name, (reference, value))| {
                (
                    name.clone(),
                    CalcInputTrace {
                        reference: reference.clone(),
                        value: value.clone(),
                    },
                )
            })
            .collect();

        let mut step = CalcStep {
            calc_key: calc_key.clone(),
            formula: def.formula,
            inputs: input_trace,
            output_field: output_field.clone(),
            status: CalcStatus::Skipped,
            note: None,
        };

        if let Some(guard_note) = check_guards(&def.guards, &inputs) {
            step.note = Some(guard_note);
            section.trace.push(step);
            continue;
        }

        match compute(def, &inputs, rounding) {
            Ok(value) => {
                section.values.insert(output_field, value);
                step.status = CalcStatus::Ok;
            }
            Err(note) => {
                step.status = CalcStatus::Error;
                step.note = Some(note);
            }
        }
        section.trace.push(step);
    }

    section
}

type ResolvedInputs = BTreeMap<String, (Option<String>, Value)>;

fn resolve_inputs(def: &CalcDef, ctx: &Value) -> ResolvedInputs {
    let mut resolved = BTreeMap::new();
    for (name, input) in &def.inputs {
        match input.as_reference() {
            Some(path) => {
                let value = resolve_path(ctx, path).cloned().unwrap_or(Value::Null);
                resolved.insert(name.clone(), (Some(path.to_string()), value));
            }
            None => {
                resolved.insert(name.clone(), (None, input.0.clone()));
            }
        }
    }
    resolved
}

/// Traverse a `$a.b.c` path through JSON objects. Non-objects end traversal.
fn resolve_path<'a>(ctx: &'a Value, path: &str) -> Option<&'a Value> {
    let trimmed = path.trim_start_matches('$').trim_start_matches('.');
    if trimmed.is_empty() {
        return Some(ctx);
    }
    let mut current = ctx;
    for part in trimmed.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn check_guards(guards: &[Guard], inputs: &ResolvedInputs) -> Option<String> {
    for guard in guards {
        match guard {
            Guard::NotNull(fields) => {
                for field in fields {
                    let missing = inputs
                        .get(field)
                        .map_or(true, |(_, v)| v.is_null());
                    if missing {
                        return Some(format!("GUARD_NOT_NULL_FAILED:{field}"));
                    }
                }
            }
            Guard::NonZero(fields) => {
                for field in fields {
                    match inputs.get(field).and_then(|(_, v)| v.as_f64()) {
                        None => return Some(format!("GUARD_NON_ZERO_INPUT_MISSING:{field}")),
                        Some(v) if v == 0.0 => {
                            return Some(format!("GUARD_NON_ZERO_FAILED:{field}"))
                        }
                        Some(_) => {}
                    }
                }
            }
        }
    }
    None
}

// Conventional input names accepted per operand, most specific first.
const LEFT_KEYS: &[&str] = &["po_unit_price_value", "left_value", "a"];
const RIGHT_KEYS: &[&str] = &["baseline_price_value", "right_value", "b"];

fn compute(
    def: &CalcDef,
    inputs: &ResolvedInputs,
    rounding: &BTreeMap<String, u32>,
) -> Result<Value, String> {
    let left = pick_numeric(inputs, LEFT_KEYS);
    let right = pick_numeric(inputs, RIGHT_KEYS);

    match def.formula {
        Formula::PctDiff => {
            let a = left.ok_or("PCT_DIFF missing left input")?;
            let b = right.ok_or("PCT_DIFF missing right input")?;
            if b == 0.0 {
                return Err("PCT_DIFF baseline is zero".to_string());
            }
            let decimals = def
                .output
                .decimals
                .or_else(|| rounding.get("pct_decimals").copied())
                .unwrap_or(2);
            let pct = ((a - b) / b) * 100.0;
            Ok(json!(round_half_up(pct, decimals)))
        }
        Formula::Gt | Formula::Lt | Formula::Eq => {
            let a = left.ok_or_else(|| format!("{:?} missing left input", def.formula))?;
            let b = right.ok_or_else(|| format!("{:?} missing right input", def.formula))?;
            let result = match def.formula {
                Formula::Gt => a > b,
                Formula::Lt => a < b,
                _ => a == b,
            };
            Ok(Value::Bool(result))
        }
    }
}

fn pick_numeric(inputs: &ResolvedInputs, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|k| inputs.get(*k))
        .and_then(|(_, v)| v.as_f64())
}

pub(crate) fn round_half_up(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::{line_item, sample_policy};
    use verdict_core::models::Baseline;

    fn procurement_calcs() -> BTreeMap<String, CalcDef> {
        sample_policy().domains["procurement"].calculations.clone()
    }

    #[test]
    fn pct_diff_computes_and_rounds() {
        let po = line_item("c", "i", 106.25, "THB");
        let ctx = build_context(
            &po,
            Some(&Baseline {
                value: 100.0,
                currency: Some("THB".to_string()),
            }),
        );
        let section = compute_all(&procurement_calcs(), &ctx, &BTreeMap::new());

        assert_eq!(section.values["variance_pct"], json!(6.25));
        assert_eq!(section.trace.len(), 1);
        assert_eq!(section.trace[0].status, CalcStatus::Ok);
    }

    #[test]
    fn zero_baseline_is_skipped_by_guard() {
        let po = line_item("c", "i", 100.0, "THB");
        let ctx = build_context(
            &po,
            Some(&Baseline {
                value: 0.0,
                currency: None,
            }),
        );
        let section = compute_all(&procurement_calcs(), &ctx, &BTreeMap::new());

        assert!(section.values.is_empty());
        assert_eq!(section.trace[0].status, CalcStatus::Skipped);
        assert_eq!(
            section.trace[0].note.as_deref(),
            Some("GUARD_NON_ZERO_FAILED:baseline_price_value")
        );
    }

    #[test]
    fn missing_baseline_is_skipped_by_not_null_guard() {
        let po = line_item("c", "i", 100.0, "THB");
        let ctx = build_context(&po, None);
        let section = compute_all(&procurement_calcs(), &ctx, &BTreeMap::new());

        assert!(section.values.is_empty());
        assert_eq!(section.trace[0].status, CalcStatus::Skipped);
        assert_eq!(
            section.trace[0].note.as_deref(),
            Some("GUARD_NOT_NULL_FAILED:baseline_price_value")
        );
    }

    #[test]
    fn path_resolution_handles_missing_segments() {
        let ctx = json!({"po": {"unit_price": {"value": 10.0}}});
        assert_eq!(
            resolve_path(&ctx, "$po.unit_price.value"),
            Some(&json!(10.0))
        );
        assert_eq!(resolve_path(&ctx, "$po.missing.value"), None);
        assert_eq!(resolve_path(&ctx, "$"), Some(&ctx));
    }
}
