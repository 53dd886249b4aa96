use std::path::Path;

use crate::errors::PolicyError;

use super::PolicyBundle;

/// Load and validate a policy bundle from a JSON document on disk.
/// Called once at process start; the returned bundle is immutable.
pub fn load_policy_from_file(path: &Path) -> Result<PolicyBundle, PolicyError> {
    let raw = std::fs::read_to_string(path).map_err(|_| PolicyError::FileNotFound {
        path: path.display().to_string(),
    })?;
    from_json_str(&raw)
}

/// Parse and validate a policy bundle from a JSON string.
pub fn from_json_str(raw: &str) -> Result<PolicyBundle, PolicyError> {
    let bundle: PolicyBundle =
        serde_json::from_str(raw).map_err(|e| PolicyError::ParseFailed {
            reason: e.to_string(),
        })?;
    bundle.validate()?;
    Ok(bundle)
}
