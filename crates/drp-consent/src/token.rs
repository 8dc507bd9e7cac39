use drp_core::{canonical_bytes, ConsentTokenId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A signed, time-limited capability permitting a specified action scope for
/// a specific user (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentToken {
    pub token_id: ConsentTokenId,
    pub user_id: String,
    pub consent_types: BTreeSet<String>,
    pub granted_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    /// Hex-encoded Ed25519 signature over `signing_payload()`.
    pub signature: String,
    pub revoked: bool,
    pub revoked_at: Option<Timestamp>,
}

/// The fields the service signs over — everything except the signature
/// itself and the mutable `revoked`/`revoked_at` bookkeeping.
#[derive(Serialize)]
struct SigningPayload<'a> {
    token_id: ConsentTokenId,
    user_id: &'a str,
    consent_types: &'a BTreeSet<String>,
    granted_at: Timestamp,
    expires_at: Option<Timestamp>,
}

impl ConsentToken {
    pub fn signing_bytes(
        token_id: ConsentTokenId,
        user_id: &str,
        consent_types: &BTreeSet<String>,
        granted_at: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Vec<u8> {
        canonical_bytes(&SigningPayload {
            token_id,
            user_id,
            consent_types,
            granted_at,
            expires_at,
        })
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        matches!(self.expires_at, Some(exp) if exp < now)
    }
}
