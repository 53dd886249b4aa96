//! # verdict-storage
//!
//! SQLite persistence for the decision engine: run lifecycle rows, per-group
//! result rows (unique on `run_id, group_id`), and the append-only audit
//! event log. One writer connection behind a mutex; the engine's write volume
//! is a handful of rows per run.

pub mod migrations;
pub mod store;

pub use store::SqliteDecisionStore;

use verdict_core::errors::{StoreError, VerdictError};

pub(crate) fn to_store_err(message: impl Into<String>) -> VerdictError {
    StoreError::SqliteError {
        message: message.into(),
    }
    .into()
}
