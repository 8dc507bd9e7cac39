//! Issued, signed, revocable capability tokens bound to user identity and
//! scope (C3, Consent Service).

pub mod service;
pub mod statistics;
pub mod token;

pub use service::{ConsentService, DEFAULT_TTL_SECS};
pub use statistics::ConsentStatistics;
pub use token::ConsentToken;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("drp-consent-test-{tag}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn create_and_validate() {
        let dir = temp_dir("create-validate");
        let svc = ConsentService::open(
            dir.join("consent_tokens.json"),
            dir.join("consent_key.raw"),
        )
        .unwrap();
        let types: BTreeSet<String> = ["post_submission".to_string()].into_iter().collect();
        let token_id = svc.create("alice", types, None).await.unwrap();
        assert!(svc.validate(token_id, "alice").await.unwrap());
        assert!(!svc.validate(token_id, "mallory").await.unwrap());
        let _ = std::fs::remove_dir_all(&dir);
    }

    /// S3: consent revoked then used.
    #[tokio::test]
    async fn revoke_then_validate_fails() {
        let dir = temp_dir("revoke");
        let svc = ConsentService::open(
            dir.join("consent_tokens.json"),
            dir.join("consent_key.raw"),
        )
        .unwrap();
        let types: BTreeSet<String> = ["x".to_string()].into_iter().collect();
        let token_id = svc.create("bob", types, None).await.unwrap();
        svc.revoke(token_id, "bob").await.unwrap();
        assert!(!svc.validate(token_id, "bob").await.unwrap());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn revoke_by_wrong_user_is_rejected() {
        let dir = temp_dir("revoke-mismatch");
        let svc = ConsentService::open(
            dir.join("consent_tokens.json"),
            dir.join("consent_key.raw"),
        )
        .unwrap();
        let types: BTreeSet<String> = ["x".to_string()].into_iter().collect();
        let token_id = svc.create("carol", types, None).await.unwrap();
        let err = svc.revoke(token_id, "mallory").await.unwrap_err();
        assert!(matches!(err, drp_core::DrpError::UserMismatch));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn expired_token_does_not_validate() {
        let dir = temp_dir("expired");
        let svc = ConsentService::open(
            dir.join("consent_tokens.json"),
            dir.join("consent_key.raw"),
        )
        .unwrap();
        let types: BTreeSet<String> = ["x".to_string()].into_iter().collect();
        let token_id = svc.create("dave", types, Some(-1)).await.unwrap();
        assert!(!svc.validate(token_id, "dave").await.unwrap());
        let removed = svc.cleanup_expired().await.unwrap();
        assert_eq!(removed, 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn statistics_reflect_token_states() {
        let dir = temp_dir("stats");
        let svc = ConsentService::open(
            dir.join("consent_tokens.json"),
            dir.join("consent_key.raw"),
        )
        .unwrap();
        let types: BTreeSet<String> = ["x".to_string()].into_iter().collect();
        let active = svc.create("erin", types.clone(), None).await.unwrap();
        let _ = active;
        let revoked = svc.create("erin", types, None).await.unwrap();
        svc.revoke(revoked, "erin").await.unwrap();
        let stats = svc.statistics().await;
        assert_eq!(stats.total_tokens, 2);
        assert_eq!(stats.active_tokens, 1);
        assert_eq!(stats.revoked_tokens, 1);
        assert_eq!(stats.unique_users, 1);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
