//! `P2PNetworkSecurity` (§4.8, supplemental): a thin façade over
//! [`SessionKeyManager`] and [`MessageProtector`] restoring the original
//! implementation's combined wrapper. Convenience only — no new semantics
//! beyond what the two sub-components already provide.

use crate::keys::SessionKeyManager;
use crate::protector::MessageProtector;
use crate::types::{ProtectedMessage, SessionKey, SessionStats};
use drp_core::{DrpResult, Value};
use std::sync::Arc;

pub struct P2PNetworkSecurity {
    keys: Arc<SessionKeyManager>,
    protector: MessageProtector,
}

impl P2PNetworkSecurity {
    pub fn new(ttl_secs: i64) -> Self {
        let keys = Arc::new(SessionKeyManager::new(ttl_secs));
        let protector = MessageProtector::new(keys.clone());
        Self { keys, protector }
    }

    pub async fn establish_session(&self, peer_id: &str) -> SessionKey {
        self.keys.establish(peer_id).await
    }

    pub async fn send(
        &self,
        message_type: &str,
        payload: Value,
        sender_id: &str,
        recipient_id: &str,
    ) -> DrpResult<ProtectedMessage> {
        self.protector
            .protect(message_type, payload, sender_id, recipient_id)
            .await
    }

    pub async fn receive(&self, msg: &ProtectedMessage) -> DrpResult<()> {
        self.protector.validate(msg).await
    }

    pub async fn revoke_session(&self, peer_id: &str) {
        self.keys.revoke_peer(peer_id).await
    }

    pub async fn cleanup_expired(&self) -> usize {
        self.keys.cleanup_expired().await
    }

    pub async fn stats(&self) -> SessionStats {
        self.keys.stats().await
    }
}

impl Default for P2PNetworkSecurity {
    fn default() -> Self {
        Self::new(crate::keys::DEFAULT_SESSION_TTL_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn establish_send_receive_round_trip() {
        let net = P2PNetworkSecurity::default();
        net.establish_session("bob").await;
        let msg = net
            .send("ping", Value::from(json!({"ok": true})), "alice", "bob")
            .await
            .unwrap();
        net.receive(&msg).await.unwrap();
    }

    #[tokio::test]
    async fn revoke_session_blocks_further_sends() {
        let net = P2PNetworkSecurity::default();
        net.establish_session("bob").await;
        net.revoke_session("bob").await;
        let err = net
            .send("ping", Value::from(json!({"ok": true})), "alice", "bob")
            .await
            .unwrap_err();
        assert_eq!(err, drp_core::DrpError::UnknownKey);
    }
}
