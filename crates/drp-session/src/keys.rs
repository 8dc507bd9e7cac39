//! Session Key Manager (§4.8): establishment, lookup of the active key per
//! peer, revocation, and expiry cleanup.

use crate::types::{SessionKey, SessionKeyStatus, SessionStats};
use drp_core::{now, DrpError, DrpResult, SessionKeyId};
use rand::RngCore;
use std::collections::HashMap;
use tokio::sync::RwLock;

const KEY_MATERIAL_LEN: usize = 32;

/// Default session lifetime (§4.8: "expires_at = now + 24h (configurable)").
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 3600;

/// Concurrent map keyed by `peer_id`, one holder per key (§5: "readers and
/// writers coordinate with a reader-writer discipline"). A peer can
/// accumulate several keys over time; `active` always picks the most
/// recent non-expired, non-revoked one.
pub struct SessionKeyManager {
    ttl: i64,
    by_peer: RwLock<HashMap<String, Vec<SessionKey>>>,
}

impl SessionKeyManager {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl: ttl_secs,
            by_peer: RwLock::new(HashMap::new()),
        }
    }

    /// `establish(peer_id) → SessionKey` (§4.8).
    pub async fn establish(&self, peer_id: &str) -> SessionKey {
        let mut material = vec![0u8; KEY_MATERIAL_LEN];
        rand::rngs::OsRng.fill_bytes(&mut material);
        let created_at = now();
        let key = SessionKey {
            key_id: SessionKeyId::new(),
            peer_id: peer_id.to_string(),
            key_material: material,
            created_at,
            expires_at: created_at + self.ttl,
            status: SessionKeyStatus::Active,
            usage_count: 0,
            last_used: None,
        };
        let mut guard = self.by_peer.write().await;
        guard.entry(peer_id.to_string()).or_default().push(key.clone());
        key
    }

    /// `active(peer_id) → SessionKey?`: the most recent non-expired,
    /// non-revoked key (§4.8).
    pub async fn active(&self, peer_id: &str) -> Option<SessionKey> {
        let guard = self.by_peer.read().await;
        let current = now();
        guard
            .get(peer_id)?
            .iter()
            .filter(|k| k.effective_status(current) == SessionKeyStatus::Active)
            .max_by_key(|k| k.created_at)
            .cloned()
    }

    /// Looks up a specific key by id, regardless of whether it is still
    /// active — used by `MessageProtector::validate` to distinguish
    /// `UnknownKey` from `Expired`/`Revoked`.
    pub async fn get(&self, key_id: SessionKeyId) -> Option<SessionKey> {
        let guard = self.by_peer.read().await;
        guard.values().flatten().find(|k| k.key_id == key_id).cloned()
    }

    /// Records a successful `validate` call: increments `usage_count` and
    /// sets `last_used` (§4.8, step 5).
    pub async fn record_use(&self, key_id: SessionKeyId) {
        let mut guard = self.by_peer.write().await;
        if let Some(key) = guard.values_mut().flatten().find(|k| k.key_id == key_id) {
            key.usage_count += 1;
            key.last_used = Some(now());
        }
    }

    pub async fn revoke(&self, key_id: SessionKeyId) -> DrpResult<()> {
        let mut guard = self.by_peer.write().await;
        let key = guard
            .values_mut()
            .flatten()
            .find(|k| k.key_id == key_id)
            .ok_or(DrpError::UnknownKey)?;
        key.status = SessionKeyStatus::Revoked;
        Ok(())
    }

    pub async fn revoke_peer(&self, peer_id: &str) {
        let mut guard = self.by_peer.write().await;
        if let Some(keys) = guard.get_mut(peer_id) {
            for key in keys {
                key.status = SessionKeyStatus::Revoked;
            }
        }
    }

    pub async fn cleanup_expired(&self) -> usize {
        let mut guard = self.by_peer.write().await;
        let current = now();
        let mut removed = 0;
        for keys in guard.values_mut() {
            let before = keys.len();
            keys.retain(|k| k.effective_status(current) != SessionKeyStatus::Expired);
            removed += before - keys.len();
        }
        removed
    }

    /// `get_session_stats` (§4.8, supplemental).
    pub async fn stats(&self) -> SessionStats {
        let guard = self.by_peer.read().await;
        let current = now();
        let mut stats = SessionStats {
            total_keys: 0,
            active_keys: 0,
            expired_keys: 0,
            revoked_keys: 0,
        };
        for key in guard.values().flatten() {
            stats.total_keys += 1;
            match key.effective_status(current) {
                SessionKeyStatus::Active => stats.active_keys += 1,
                SessionKeyStatus::Expired => stats.expired_keys += 1,
                SessionKeyStatus::Revoked => stats.revoked_keys += 1,
            }
        }
        stats
    }
}

impl Default for SessionKeyManager {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL_SECS)
    }
}
