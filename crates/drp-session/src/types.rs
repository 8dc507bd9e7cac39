use drp_core::{MessageId, SessionKeyId, Timestamp, Value};
use serde::{Deserialize, Serialize};

/// Protocol version stamped into every protected message and included in
/// the MAC input (§3).
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKeyStatus {
    Active,
    Expired,
    Revoked,
}

/// Ephemeral symmetric key shared between two peers, used to MAC messages
/// (§3, C8). Owned by a single local node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionKey {
    pub key_id: SessionKeyId,
    pub peer_id: String,
    pub key_material: Vec<u8>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub status: SessionKeyStatus,
    pub usage_count: u64,
    pub last_used: Option<Timestamp>,
}

impl SessionKey {
    /// Effective status at `now`: a key can be `Active` on disk yet expired
    /// by the clock; callers always consult this rather than `status`
    /// directly when the distinction matters.
    pub fn effective_status(&self, now: Timestamp) -> SessionKeyStatus {
        if self.status == SessionKeyStatus::Revoked {
            SessionKeyStatus::Revoked
        } else if self.expires_at < now {
            SessionKeyStatus::Expired
        } else {
            SessionKeyStatus::Active
        }
    }
}

/// Snapshot returned by `SessionKeyManager::stats()`, restoring the
/// original implementation's `get_session_stats` (§4.8, supplemental).
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub total_keys: usize,
    pub active_keys: usize,
    pub expired_keys: usize,
    pub revoked_keys: usize,
}

/// An HMAC-authenticated message exchanged over the session channel (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedMessage {
    pub message_id: MessageId,
    #[serde(rename = "type")]
    pub message_type: String,
    pub payload: Value,
    pub timestamp: Timestamp,
    pub sender_id: String,
    pub recipient_id: String,
    pub nonce: Vec<u8>,
    pub session_key_id: SessionKeyId,
    pub mac: String,
    pub version: u32,
}

/// The fields covered by the MAC — everything in the message except the
/// MAC itself (§4.8, step 3).
#[derive(Serialize)]
pub(crate) struct MacInput<'a> {
    pub message_id: MessageId,
    #[serde(rename = "type")]
    pub message_type: &'a str,
    pub payload: &'a Value,
    pub timestamp: Timestamp,
    pub sender: &'a str,
    pub recipient: &'a str,
    pub nonce: &'a [u8],
    pub version: u32,
}
