use crate::errors::VerdictResult;
use crate::models::AuditEvent;

/// Fire-and-forget audit sink.
///
/// Emission is best-effort by contract: callers log an `Err` and continue;
/// a failure to audit must never abort the decision pipeline.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: &AuditEvent) -> VerdictResult<()>;
}
