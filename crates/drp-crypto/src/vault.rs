//! KeyVault (C2): the façade every other component calls into for key
//! derivation, field encryption, and identity signing.

use crate::field;
use crate::identity::{self, IdentityKeyPair, KeyScheme};
use crate::master::MasterKey;
use drp_core::DrpResult;
use std::path::Path;

pub struct KeyVault {
    master: MasterKey,
}

impl KeyVault {
    pub fn open(master_key_file: impl AsRef<Path>) -> DrpResult<Self> {
        Ok(Self {
            master: MasterKey::load_or_generate(master_key_file)?,
        })
    }

    pub fn derive_user_key(&self, user_hash: &str) -> [u8; 32] {
        self.master.derive_user_key(user_hash)
    }

    pub fn encrypt_field(&self, user_hash: &str, plaintext: &[u8]) -> DrpResult<String> {
        let key = self.derive_user_key(user_hash);
        field::encrypt_field(&key, plaintext)
    }

    pub fn decrypt_field(&self, user_hash: &str, blob: &str) -> DrpResult<Vec<u8>> {
        let key = self.derive_user_key(user_hash);
        field::decrypt_field(&key, blob)
    }

    pub fn generate_identity_keypair(&self, scheme: KeyScheme) -> DrpResult<IdentityKeyPair> {
        IdentityKeyPair::generate(scheme)
    }

    pub fn sign(&self, keypair: &IdentityKeyPair, msg: &[u8]) -> DrpResult<Vec<u8>> {
        keypair.sign(msg)
    }

    pub fn verify(
        &self,
        scheme: KeyScheme,
        public_key: &[u8],
        msg: &[u8],
        sig: &[u8],
    ) -> DrpResult<bool> {
        identity::verify(scheme, public_key, msg, sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip_per_user() {
        let dir = std::env::temp_dir().join(format!("drp-vault-test-{}", std::process::id()));
        let vault = KeyVault::open(dir.join("master_key.key")).unwrap();
        let blob = vault.encrypt_field("u1", b"secret").unwrap();
        assert_eq!(vault.decrypt_field("u1", &blob).unwrap(), b"secret");
        assert!(vault.decrypt_field("u2", &blob).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
