/// Storage-layer errors for run, result, and audit persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("invalid run transition for {run_id}: {from} -> {to}")]
    InvalidTransition {
        run_id: String,
        from: String,
        to: String,
    },

    #[error("serialization failed: {reason}")]
    SerializationFailed { reason: String },

    #[error("audit sink unavailable: {reason}")]
    AuditUnavailable { reason: String },
}
