//! Package signing key import for RPM-based hosts

use std::path::Path;

use crate::error::{FalconError, Result};

use super::command::Invocation;

pub fn import_invocation(key: &Path) -> Invocation {
    Invocation::new("rpm", ["--import".to_string(), key.display().to_string()])
}

/// Import the signing key at `key` into the RPM database.
pub fn import_key(key: &Path) -> Result<()> {
    if !key.is_file() {
        return Err(FalconError::SigningKeyImportFailed {
            path: key.display().to_string(),
            reason: "file not found".to_string(),
        });
    }
    import_invocation(key)
        .run()
        .map(|_| tracing::info!(key = %key.display(), "Signing key imported"))
        .map_err(|reason| FalconError::SigningKeyImportFailed {
            path: key.display().to_string(),
            reason,
        })
}
