//! Message Protector (§4.8): HMAC-SHA256 authentication, replay defense, and
//! the freshness window over `ProtectedMessage`s exchanged on an
//! established session.

use crate::keys::SessionKeyManager;
use crate::types::{MacInput, ProtectedMessage, PROTOCOL_VERSION};
use drp_core::{canonical_bytes, now, DrpError, DrpResult, MessageId, Value};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type HmacSha256 = Hmac<Sha256>;

/// Freshness window: a message whose `timestamp` is more than this many
/// seconds away from the validator's clock (past or future) is rejected as
/// `Stale` (§4.8).
const FRESHNESS_WINDOW_SECS: i64 = 10 * 60;

/// Replay cache retention: message ids are remembered for this long after
/// first being seen (§4.8).
const REPLAY_TTL_SECS: i64 = 5 * 60;

const NONCE_LEN: usize = 16;

/// Authenticates and validates `ProtectedMessage`s against the session keys
/// held by a `SessionKeyManager`. Tracks seen message ids in a TTL'd cache
/// to reject replays.
pub struct MessageProtector {
    keys: Arc<SessionKeyManager>,
    seen: RwLock<HashMap<MessageId, i64>>,
}

impl MessageProtector {
    pub fn new(keys: Arc<SessionKeyManager>) -> Self {
        Self {
            keys,
            seen: RwLock::new(HashMap::new()),
        }
    }

    /// `protect(type, payload, sender, recipient) → ProtectedMessage`
    /// (§4.8): looks up the active session key for `recipient`, computes the
    /// MAC over the canonical encoding of every other field, and returns the
    /// assembled message.
    pub async fn protect(
        &self,
        message_type: &str,
        payload: Value,
        sender_id: &str,
        recipient_id: &str,
    ) -> DrpResult<ProtectedMessage> {
        let key = self
            .keys
            .active(recipient_id)
            .await
            .ok_or(DrpError::UnknownKey)?;

        let mut nonce = vec![0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let message_id = MessageId::new();
        let timestamp = now();

        let input = MacInput {
            message_id,
            message_type,
            payload: &payload,
            timestamp,
            sender: sender_id,
            recipient: recipient_id,
            nonce: &nonce,
            version: PROTOCOL_VERSION,
        };
        let mac = compute_mac(&key.key_material, &input)?;

        Ok(ProtectedMessage {
            message_id,
            message_type: message_type.to_string(),
            payload,
            timestamp,
            sender_id: sender_id.to_string(),
            recipient_id: recipient_id.to_string(),
            nonce,
            session_key_id: key.key_id,
            mac,
            version: PROTOCOL_VERSION,
        })
    }

    /// `validate(msg) → Valid | Error(reason)` (§4.8). Checks, in order:
    /// 1. the session key referenced by the message exists and is active,
    /// 2. the message id has not been seen before (replay),
    /// 3. the timestamp falls within the freshness window,
    /// 4. the MAC recomputed over the message matches, in constant time.
    pub async fn validate(&self, msg: &ProtectedMessage) -> DrpResult<()> {
        let key = self
            .keys
            .get(msg.session_key_id)
            .await
            .ok_or(DrpError::UnknownKey)?;
        if key.effective_status(now()) != crate::types::SessionKeyStatus::Active {
            return Err(DrpError::UnknownKey);
        }

        self.check_replay(msg.message_id).await?;

        let current = now();
        if (msg.timestamp - current).abs() > FRESHNESS_WINDOW_SECS {
            return Err(DrpError::Stale);
        }

        let input = MacInput {
            message_id: msg.message_id,
            message_type: &msg.message_type,
            payload: &msg.payload,
            timestamp: msg.timestamp,
            sender: &msg.sender_id,
            recipient: &msg.recipient_id,
            nonce: &msg.nonce,
            version: msg.version,
        };
        let expected = compute_mac(&key.key_material, &input)?;
        if !constant_time_eq(expected.as_bytes(), msg.mac.as_bytes()) {
            return Err(DrpError::MacMismatch);
        }

        self.mark_seen(msg.message_id, msg.timestamp).await;
        self.keys.record_use(msg.session_key_id).await;
        Ok(())
    }

    /// Membership check only; does not record `message_id` as seen. Caching
    /// happens on the success path in `validate`, after the MAC check
    /// passes, so a rejected (tampered) message never poisons the replay
    /// cache for its `message_id` (§4.8 step 5).
    async fn check_replay(&self, message_id: MessageId) -> DrpResult<()> {
        let current = now();
        let mut guard = self.seen.write().await;
        guard.retain(|_, seen_at| current - *seen_at < REPLAY_TTL_SECS);
        if guard.contains_key(&message_id) {
            return Err(DrpError::Replay);
        }
        Ok(())
    }

    async fn mark_seen(&self, message_id: MessageId, timestamp: i64) {
        let mut guard = self.seen.write().await;
        guard.insert(message_id, timestamp);
    }
}

fn compute_mac(key_material: &[u8], input: &MacInput<'_>) -> DrpResult<String> {
    let bytes = canonical_bytes(input);
    let mut mac = HmacSha256::new_from_slice(key_material)
        .map_err(|e| DrpError::CryptoFailure(format!("hmac key: {e}")))?;
    mac.update(&bytes);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.len() == b.len() && a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn protector() -> (Arc<SessionKeyManager>, MessageProtector) {
        let keys = Arc::new(SessionKeyManager::default());
        keys.establish("bob").await;
        let protector = MessageProtector::new(keys.clone());
        (keys, protector)
    }

    #[tokio::test]
    async fn protect_then_validate_round_trip() {
        let (_keys, protector) = protector().await;
        let msg = protector
            .protect("ping", Value::from(json!({"n": 1})), "alice", "bob")
            .await
            .unwrap();
        protector.validate(&msg).await.unwrap();
    }

    #[tokio::test]
    async fn replayed_message_is_rejected() {
        let (_keys, protector) = protector().await;
        let msg = protector
            .protect("ping", Value::from(json!({"n": 1})), "alice", "bob")
            .await
            .unwrap();
        protector.validate(&msg).await.unwrap();
        let err = protector.validate(&msg).await.unwrap_err();
        assert_eq!(err, DrpError::Replay);
    }

    #[tokio::test]
    async fn tampered_payload_fails_mac() {
        let (_keys, protector) = protector().await;
        let mut msg = protector
            .protect("ping", Value::from(json!({"n": 1})), "alice", "bob")
            .await
            .unwrap();
        msg.payload = Value::from(json!({"n": 2}));
        let err = protector.validate(&msg).await.unwrap_err();
        assert_eq!(err, DrpError::MacMismatch);
    }

    #[tokio::test]
    async fn stale_message_is_rejected() {
        let (_keys, protector) = protector().await;
        let mut msg = protector
            .protect("ping", Value::from(json!({"n": 1})), "alice", "bob")
            .await
            .unwrap();
        msg.timestamp -= FRESHNESS_WINDOW_SECS + 1;
        let err = protector.validate(&msg).await.unwrap_err();
        assert_eq!(err, DrpError::Stale);
    }

    #[tokio::test]
    async fn tampered_resend_does_not_poison_replay_cache_for_original() {
        let (_keys, protector) = protector().await;
        let msg = protector
            .protect("ping", Value::from(json!({"n": 1})), "alice", "bob")
            .await
            .unwrap();

        let mut tampered = msg.clone();
        tampered.payload = Value::from(json!({"n": 2}));
        let err = protector.validate(&tampered).await.unwrap_err();
        assert_eq!(err, DrpError::MacMismatch);

        // The correctly-MACed original must still validate: the rejected
        // tampered copy must not have marked `message_id` as seen.
        protector.validate(&msg).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_session_key_is_rejected() {
        let (_keys, protector) = protector().await;
        let mut msg = protector
            .protect("ping", Value::from(json!({"n": 1})), "alice", "bob")
            .await
            .unwrap();
        msg.session_key_id = drp_core::SessionKeyId::new();
        let err = protector.validate(&msg).await.unwrap_err();
        assert_eq!(err, DrpError::UnknownKey);
    }
}
