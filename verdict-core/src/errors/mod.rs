//! Error types for the verdict workspace, one enum per concern,
//! aggregated into [`VerdictError`].

mod engine_error;
mod policy_error;
mod store_error;

pub use engine_error::EngineError;
pub use policy_error::PolicyError;
pub use store_error::StoreError;

/// Top-level error aggregating all subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum VerdictError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Workspace-wide result alias.
pub type VerdictResult<T> = Result<T, VerdictError>;
