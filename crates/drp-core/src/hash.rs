//! Generic hashing helpers. SHA-256 is used throughout the gateway for
//! `user_hash`, `metadata_hash`, and the anchor's block-hash digest, so it
//! lives here rather than duplicated per crate.

use sha2::{Digest, Sha256};

pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256_bytes(data))
}

/// Generic salted one-way hash: a stable but non-reversible handle on a
/// value, used where a caller wants correlation without going through the
/// full per-user envelope-encryption path.
pub fn hash_privacy_preserving(value: &str, salt: Option<&str>) -> String {
    let salted = format!("{}{}", salt.unwrap_or(""), value);
    sha256_hex(salted.as_bytes())
}
