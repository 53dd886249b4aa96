use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A policy-declared derived value, computed per group before rule
/// evaluation. Outputs land in the group trace's calculation section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcDef {
    pub formula: Formula,
    /// Input name → literal or `$`-path reference into the calc context.
    #[serde(default)]
    pub inputs: BTreeMap<String, CalcInput>,
    #[serde(default)]
    pub guards: Vec<Guard>,
    #[serde(default)]
    pub output: CalcOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Formula {
    /// `((a - b) / b) * 100`, rounded half-up.
    PctDiff,
    Gt,
    Lt,
    Eq,
}

/// Either a literal JSON value or a reference like `$po.unit_price.value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalcInput(pub serde_json::Value);

impl CalcInput {
    /// The `$`-path if this input is a reference, `None` for literals.
    pub fn as_reference(&self) -> Option<&str> {
        self.0.as_str().filter(|s| s.starts_with('$'))
    }
}

/// Input guard. A failed guard skips the calculation; it never fails the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    NotNull(Vec<String>),
    NonZero(Vec<String>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalcOutput {
    /// Output field name; defaults to the calc key.
    #[serde(default)]
    pub field: Option<String>,
    /// Decimal places for numeric outputs; defaults to 2.
    #[serde(default)]
    pub decimals: Option<u32>,
}
