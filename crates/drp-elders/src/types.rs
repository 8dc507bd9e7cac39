use drp_core::{ElderId, Timestamp};
use serde::{Deserialize, Serialize};

/// Public-facing view of a single Elder signer (C6). Mutated only via
/// `active`/`signature_count`/`last_seen`; `elder_id`/`public_key`/`weight`
/// are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElderInfo {
    pub elder_id: ElderId,
    pub public_key: Vec<u8>,
    pub weight: u32,
    pub active: bool,
    pub revoked: bool,
    pub signature_count: u64,
    pub last_seen: Option<Timestamp>,
}

impl ElderInfo {
    /// Membership in `E_eff`: active and not in the revocation set.
    pub fn is_effective(&self) -> bool {
        self.active && !self.revoked
    }
}

/// One Elder's signature over an anchor payload's canonical encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElderSignature {
    pub elder_id: ElderId,
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
    pub weight: u32,
    pub timestamp: Timestamp,
}

/// Snapshot returned by `status()`.
#[derive(Debug, Clone, Serialize)]
pub struct QuorumStatus {
    pub total_elders: usize,
    pub active_elders: usize,
    pub revoked_elders: usize,
    pub count_threshold: usize,
    pub weight_threshold: u32,
    pub elders: Vec<ElderInfo>,
}

/// On-disk record in the Elder keys file: the public `ElderInfo` plus the
/// raw Ed25519 secret, hex-encoded. Never leaves this crate's persistence
/// layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedElder {
    pub info: ElderInfo,
    pub secret_hex: String,
}
