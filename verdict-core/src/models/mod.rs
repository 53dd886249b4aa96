//! Domain records: case evidence, facts, line items, selection output, and
//! decision-run output. All shapes are serde types; trace and snapshot fields
//! serialize to the persisted JSON contract consumers rely on.

mod audit;
mod decision;
mod evidence;
mod fact;
mod line_item;
mod selection;

pub use audit::{AuditEvent, AuditEventType};
pub use decision::{
    CalcInputTrace, CalcSection, CalcStatus, CalcStep, DecisionResult, DecisionRun, GroupDecision, GroupOutcome,
    GroupTrace, PolicyRef, RuleResult, RuleTrace, RunDecision, RunOutcome, RunStatus,
    TraceInputs, TraceSelection,
};
pub use evidence::{AnchorType, DocumentLink, Evidence, EvidenceGroup, LinkStatus, UNGROUPED_KEY};
pub use fact::{Fact, FactValue};
pub use line_item::LineItem;
pub use selection::{
    Baseline, BaselineSource, CaseSelection, EvidenceRefs, ReadinessFlags, SelectionResult,
    SelectionSummary, TechniqueAttempt,
};
