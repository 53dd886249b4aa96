//! # verdict-decision
//!
//! The Decision Run stage: consumes Technical Selection output (baselines are
//! never re-derived here), evaluates every applicable policy rule per group,
//! aggregates severities into group and case decisions, and persists an
//! immutable, replayable run record with a full audit trail.

pub mod aggregate;
pub mod calc;
pub mod rules;
pub mod runner;

pub use runner::DecisionRunner;
