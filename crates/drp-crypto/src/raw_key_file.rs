//! Shared helper for the "32 raw bytes on disk" key files the persisted
//! state layout specifies (`consent_key.raw`, and the per-elder secrets
//! inside `elder_keys.json`): generate on first use, restrict permissions.

use crate::identity::IdentityKeyPair;
use drp_core::{DrpError, DrpResult};
use rand::RngCore;
use std::path::Path;

/// Loads a single Ed25519 signing key from a 32-byte raw file, generating
/// and persisting a fresh one if the file does not exist.
pub fn load_or_generate_ed25519(path: impl AsRef<Path>) -> DrpResult<IdentityKeyPair> {
    let path = path.as_ref();
    if path.exists() {
        let raw = std::fs::read(path)
            .map_err(|e| DrpError::Internal(format!("reading key file {}: {e}", path.display())))?;
        let secret: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| DrpError::Internal(format!("key file {} is not 32 bytes", path.display())))?;
        Ok(IdentityKeyPair::from_ed25519_secret_bytes(&secret))
    } else {
        let mut secret = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        write_restricted(path, &secret)?;
        Ok(IdentityKeyPair::from_ed25519_secret_bytes(&secret))
    }
}

pub fn write_restricted(path: &Path, bytes: &[u8]) -> DrpResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| DrpError::Internal(format!("creating data dir: {e}")))?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes).map_err(|e| DrpError::Internal(format!("writing {}: {e}", path.display())))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| DrpError::Internal(format!("restricting perms on {}: {e}", path.display())))?;
    }
    std::fs::rename(&tmp, path)
        .map_err(|e| DrpError::Internal(format!("installing {}: {e}", path.display())))?;
    Ok(())
}
