/// Errors raised by the selection and decision-run engines.
///
/// Only hard input errors live here. Per-group soft failures (missing anchor,
/// missing facts, gate failures) resolve to deterministic decisions and are
/// never surfaced as errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("selection case mismatch: expected {expected}, got {got}")]
    SelectionCaseMismatch { expected: String, got: String },

    #[error("selection domain mismatch: expected {expected}, got {got}")]
    SelectionDomainMismatch { expected: String, got: String },

    #[error("decision run {run_id} failed: {reason}")]
    RunFailed { run_id: String, reason: String },

    #[error("worker pool build failed: {reason}")]
    WorkerPoolBuild { reason: String },
}
