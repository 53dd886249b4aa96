//! # verdict-core
//!
//! Foundation crate for the verdict decision engine.
//! Defines the policy model, domain records, collaborator store traits,
//! errors, and canonical hashing. Every other crate in the workspace
//! depends on this.

pub mod errors;
pub mod hash;
pub mod models;
pub mod policy;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use errors::{VerdictError, VerdictResult};
pub use models::{CaseSelection, DecisionResult, DecisionRun, SelectionResult};
pub use policy::{DomainProfile, PolicyBundle, Rule, Severity, Technique};
