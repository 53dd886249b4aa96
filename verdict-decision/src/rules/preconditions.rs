//! Applicability checks. A precondition that does not hold makes the rule
//! inapplicable for the group; it is never counted as a failure.

use verdict_core::policy::Preconditions;

use super::RuleContext;

pub fn preconditions_hold(pre: &Preconditions, ctx: &RuleContext<'_>) -> bool {
    if let Some(required) = pre.baseline_available {
        if ctx.baseline_available() != required {
            return false;
        }
    }

    if let Some(source) = &pre.baseline_source {
        match ctx.baseline_source {
            Some(actual) if actual.fact_type == *source => {}
            _ => return false,
        }
    }

    for artifact in &pre.artifacts_present {
        if !ctx.artifacts_present.contains(artifact) {
            return false;
        }
    }

    if let Some(missing) = &pre.artifact_missing {
        if ctx.artifacts_present.contains(missing) {
            return false;
        }
    }

    true
}
