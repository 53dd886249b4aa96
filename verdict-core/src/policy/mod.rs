//! Versioned, immutable policy model.
//!
//! A [`PolicyBundle`] is parsed once at startup, validated at the load
//! boundary, and passed by `Arc` into every engine constructor. There is no
//! process-wide registry and no post-load mutation; a reload replaces the
//! whole bundle atomically.

mod bundle;
mod calc;
mod loader;
mod rule;
mod technique;

pub use bundle::{DomainProfile, PolicyBundle, PolicyMeta};
pub use calc::{CalcDef, CalcInput, CalcOutput, Formula, Guard};
pub use loader::{from_json_str, load_policy_from_file};
pub use rule::{Explanation, FailAction, Preconditions, Rule, RuleLogic, Severity};
pub use technique::{
    DeriveSpec, Gates, MinConfidenceGate, Technique, TechniqueCategory, FALLBACK_TECHNIQUE,
};
