//! End-to-end orchestration of a proof submission, and the read-only
//! lookup surface over the resulting index rows (C9 Submission Pipeline,
//! C11 Read API).

pub mod pipeline;
pub mod read_api;
pub mod types;

pub use pipeline::SubmissionPipeline;
pub use read_api::ReadApi;
pub use types::{EncryptionMetadata, ProofSubmission, ReadProof, StoredProofObject, SubmitResult};

#[cfg(test)]
mod tests {
    use super::*;
    use drp_anchor::{AnchorService, DigestLedger};
    use drp_audit::AuditLog;
    use drp_consent::ConsentService;
    use drp_content::InMemoryContentStore;
    use drp_core::Value;
    use drp_crypto::KeyVault;
    use drp_elders::ElderQuorum;
    use drp_index::InMemoryMetadataIndex;
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("drp-pipeline-test-{tag}-{}", uuid::Uuid::new_v4()))
    }

    async fn harness(tag: &str) -> (SubmissionPipeline, ReadApi, Arc<ConsentService>) {
        let dir = temp_dir(tag);
        std::fs::create_dir_all(&dir).unwrap();

        let vault = Arc::new(KeyVault::open(dir.join("master_key.key")).unwrap());
        let consent = Arc::new(
            ConsentService::open(dir.join("consent_tokens.json"), dir.join("consent_key.raw")).unwrap(),
        );
        let content: Arc<dyn drp_content::ContentStore> = Arc::new(InMemoryContentStore::new());
        let index: Arc<dyn drp_index::MetadataIndex> = Arc::new(InMemoryMetadataIndex::new());
        let elders = Arc::new(ElderQuorum::open(dir.join("elder_keys.json"), 2, 3).unwrap());
        let ledger: Arc<dyn drp_anchor::Ledger> = Arc::new(DigestLedger::new());
        let anchor = Arc::new(AnchorService::new(elders, ledger, index.clone()));
        let audit = Arc::new(AuditLog::open(dir.join("audit")).unwrap());

        let pipeline = SubmissionPipeline::new(
            consent.clone(),
            vault,
            content,
            index.clone(),
            anchor.clone(),
            audit,
        );
        let read_api = ReadApi::new(index, anchor);
        (pipeline, read_api, consent)
    }

    /// S1: end-to-end submission, by_cid reflects the stored metadata with
    /// anchoring still pending.
    #[tokio::test]
    async fn submit_then_read_back_by_cid() {
        let (pipeline, read_api, consent) = harness("s1").await;
        let types: BTreeSet<String> = ["post_submission".to_string()].into_iter().collect();
        let token_id = consent.create("alice", types, None).await.unwrap();

        let request = ProofSubmission {
            proof_type: "PoST".to_string(),
            user_id: "alice".to_string(),
            activity_data: Value::from(json!({"score": 42, "personal_data": {"name": "A"}})),
            consent_token: token_id,
            timestamp: Some(1_700_000_000),
            metadata: Some(Value::from(json!({"k": "v"}))),
        };

        let result = pipeline.submit(request).await.unwrap();
        assert!(!result.cid.is_empty());

        let proof = read_api.by_cid(&result.cid).await.unwrap().unwrap();
        assert_eq!(proof.user_hash, drp_core::UserHash::of("alice"));
        assert_eq!(proof.proof_type, "PoST");
        assert_eq!(proof.timestamp, 1_700_000_000);
        assert!(!proof.is_verified);
    }

    #[tokio::test]
    async fn submit_with_invalid_consent_is_rejected() {
        let (pipeline, _read_api, _consent) = harness("consent-denied").await;
        let request = ProofSubmission {
            proof_type: "PoST".to_string(),
            user_id: "mallory".to_string(),
            activity_data: Value::from(json!({"score": 1})),
            consent_token: drp_core::ConsentTokenId::new(),
            timestamp: None,
            metadata: None,
        };
        let err = pipeline.submit(request).await.unwrap_err();
        assert!(matches!(err, drp_core::DrpError::ConsentDenied(_)));
    }

    #[tokio::test]
    async fn submit_then_anchor_eventually_marks_verified() {
        let (pipeline, read_api, consent) = harness("anchor-eventual").await;
        let types: BTreeSet<String> = ["post_submission".to_string()].into_iter().collect();
        let token_id = consent.create("bob", types, None).await.unwrap();

        let request = ProofSubmission {
            proof_type: "PoAT".to_string(),
            user_id: "bob".to_string(),
            activity_data: Value::from(json!({"score": 7})),
            consent_token: token_id,
            timestamp: Some(1_700_000_500),
            metadata: None,
        };
        let result = pipeline.submit(request).await.unwrap();

        // Background anchoring is spawned; give the runtime a turn.
        for _ in 0..20 {
            if read_api.by_cid(&result.cid).await.unwrap().unwrap().is_verified {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("anchor never completed in time");
    }
}
