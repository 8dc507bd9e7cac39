//! Long-term master key: 32 raw bytes persisted at `MASTER_KEY_FILE`,
//! generated on first use (§6, persisted state layout).

use drp_core::{DrpError, DrpResult};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, Zeroizing};

const MASTER_KEY_LEN: usize = 32;
const USER_KEY_SALT: &[u8] = b"drp_user_key_salt";

pub struct MasterKey {
    path: PathBuf,
    bytes: Zeroizing<[u8; MASTER_KEY_LEN]>,
}

impl MasterKey {
    /// Loads the master key from `path`, generating and persisting a fresh
    /// one if the file does not exist yet.
    pub fn load_or_generate(path: impl AsRef<Path>) -> DrpResult<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            let raw = std::fs::read(&path)
                .map_err(|e| DrpError::Internal(format!("reading master key: {e}")))?;
            if raw.len() != MASTER_KEY_LEN {
                return Err(DrpError::Internal(format!(
                    "master key file {} has unexpected length {}",
                    path.display(),
                    raw.len()
                )));
            }
            let mut bytes = [0u8; MASTER_KEY_LEN];
            bytes.copy_from_slice(&raw);
            Ok(Self {
                path,
                bytes: Zeroizing::new(bytes),
            })
        } else {
            let mut bytes = [0u8; MASTER_KEY_LEN];
            rand::rngs::OsRng.fill_bytes(&mut bytes);
            write_restricted(&path, &bytes)?;
            Ok(Self {
                path,
                bytes: Zeroizing::new(bytes),
            })
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// HKDF-SHA256 with the fixed salt and `info = user_hash`, producing a
    /// 32-byte per-user key (§4.2). A pure function of `(master, user_hash)`.
    pub fn derive_user_key(&self, user_hash: &str) -> [u8; 32] {
        let hk = Hkdf::<Sha256>::new(Some(USER_KEY_SALT), self.bytes.as_slice());
        let mut okm = [0u8; 32];
        hk.expand(user_hash.as_bytes(), &mut okm)
            .expect("32 bytes is a valid HKDF-SHA256 output length");
        okm
    }
}

fn write_restricted(path: &Path, bytes: &[u8]) -> DrpResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| DrpError::Internal(format!("creating data dir: {e}")))?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes).map_err(|e| DrpError::Internal(format!("writing master key: {e}")))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| DrpError::Internal(format!("restricting master key perms: {e}")))?;
    }
    std::fs::rename(&tmp, path).map_err(|e| DrpError::Internal(format!("installing master key: {e}")))?;
    Ok(())
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MasterKey {{ path: {:?} }}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_user_key_is_pure() {
        let dir = std::env::temp_dir().join(format!("drp-master-test-{}", std::process::id()));
        let key = MasterKey::load_or_generate(dir.join("master_key.key")).unwrap();
        let k1 = key.derive_user_key("abc");
        let k2 = key.derive_user_key("abc");
        let k3 = key.derive_user_key("xyz");
        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
