//! Shared types, the canonical encoder, and the error taxonomy used by every
//! component of the gateway.

pub mod canonical;
pub mod error;
pub mod hash;
pub mod jsonfile;
pub mod types;
pub mod value;

pub use canonical::{canonical_bytes, canonical_bytes_of};
pub use error::{DrpError, DrpResult};
pub use hash::{hash_privacy_preserving, sha256_bytes, sha256_hex};
pub use types::{Cid, ConsentTokenId, ElderId, MessageId, ProofId, SessionKeyId, Timestamp, UserHash};
pub use value::Value;

/// Current time as seconds since epoch. Centralized so tests can reason
/// about it and no component reaches for `SystemTime` directly.
pub fn now() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as Timestamp
}
