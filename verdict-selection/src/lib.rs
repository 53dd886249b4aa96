//! # verdict-selection
//!
//! Technical Selection: for each evidence group in a case, walk the domain's
//! baseline-priority chain and deterministically resolve a baseline reference
//! value, or fall back to "no baseline, escalate". Every attempt is traced.

pub mod context;
pub mod engine;

pub use context::GroupContext;
pub use engine::SelectionEngine;
