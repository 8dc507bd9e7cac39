//! Write-temp-then-rename discipline for the JSON-file-backed "databases"
//! (consent tokens, Elder keys) described in the design notes: concurrent
//! safety comes from pairing this with an in-process reader-writer lock
//! around the in-memory copy, not from the file write itself.

use crate::error::{DrpError, DrpResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Loads and parses `path` as JSON, returning `None` if it does not exist.
pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> DrpResult<Option<T>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read(path)
        .map_err(|e| DrpError::Internal(format!("reading {}: {e}", path.display())))?;
    let value = serde_json::from_slice(&raw)
        .map_err(|e| DrpError::Internal(format!("parsing {}: {e}", path.display())))?;
    Ok(Some(value))
}

/// Serializes `value` as pretty JSON and installs it at `path` atomically:
/// write to a sibling `.tmp` file, then rename over the destination.
pub fn save<T: Serialize>(path: impl AsRef<Path>, value: &T) -> DrpResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| DrpError::Internal(format!("creating {}: {e}", parent.display())))?;
    }
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| DrpError::Internal(format!("serializing {}: {e}", path.display())))?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &bytes)
        .map_err(|e| DrpError::Internal(format!("writing {}: {e}", tmp.display())))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| DrpError::Internal(format!("restricting perms on {}: {e}", tmp.display())))?;
    }
    std::fs::rename(&tmp, path)
        .map_err(|e| DrpError::Internal(format!("installing {}: {e}", path.display())))?;
    Ok(())
}
