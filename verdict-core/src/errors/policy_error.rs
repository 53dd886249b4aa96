/// Policy-load and policy-resolution errors.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("policy file not found: {path}")]
    FileNotFound { path: String },

    #[error("policy parse failed: {reason}")]
    ParseFailed { reason: String },

    #[error("policy {policy_id}@{version} invalid: {reason}")]
    Invalid {
        policy_id: String,
        version: String,
        reason: String,
    },

    #[error("domain not found in policy: {domain_code}")]
    DomainNotFound { domain_code: String },
}
