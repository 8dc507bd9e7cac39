//! Submission Pipeline (C9, §4.9): the end-to-end `submit` algorithm —
//! consent gate, per-user encryption, content-addressed upload, metadata
//! indexing, and deferred anchoring.

use crate::types::{EncryptionMetadata, ProofSubmission, StoredProofObject, SubmitResult};
use drp_anchor::AnchorService;
use drp_audit::{AuditEvent, AuditLog, EventType, Level};
use drp_consent::ConsentService;
use drp_content::ContentStore;
use drp_core::{canonical_bytes, now, sha256_hex, Cid, DrpError, DrpResult, ProofId, UserHash, Value};
use drp_crypto::{is_sensitive_field, KeyVault};
use drp_index::{MetadataIndex, MetadataRow};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

const ENCRYPTION_ALGORITHM: &str = "chacha20poly1305";
const ENCRYPTION_VERSION: u32 = 1;

pub struct SubmissionPipeline {
    consent: Arc<ConsentService>,
    vault: Arc<KeyVault>,
    content: Arc<dyn ContentStore>,
    index: Arc<dyn MetadataIndex>,
    anchor: Arc<AnchorService>,
    audit: Arc<AuditLog>,
}

impl SubmissionPipeline {
    pub fn new(
        consent: Arc<ConsentService>,
        vault: Arc<KeyVault>,
        content: Arc<dyn ContentStore>,
        index: Arc<dyn MetadataIndex>,
        anchor: Arc<AnchorService>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            consent,
            vault,
            content,
            index,
            anchor,
            audit,
        }
    }

    /// Runs the 12-step `submit(proof)` algorithm (§4.9). On any failure in
    /// steps 3-9, logs `PROOF_ERROR` and returns the typed error; steps
    /// already performed are not compensated.
    pub async fn submit(&self, request: ProofSubmission) -> DrpResult<SubmitResult> {
        // 1. Allocate proof_id.
        let proof_id = ProofId::new();

        // 2. Log PROOF_SUBMISSION.
        let _ = self
            .audit
            .log(
                AuditEvent::new(EventType::ProofSubmission, Level::Info, "proof submission received")
                    .with_data(json!({"proof_id": proof_id.to_string(), "proof_type": request.proof_type})),
            )
            .await;

        match self.run(proof_id, &request).await {
            Ok(result) => Ok(result),
            Err(e) => {
                let _ = self
                    .audit
                    .log(
                        AuditEvent::new(EventType::ProofError, Level::Error, e.to_string())
                            .with_data(json!({"proof_id": proof_id.to_string()})),
                    )
                    .await;
                error!(%proof_id, error = %e, "proof submission failed");
                Err(e)
            }
        }
    }

    async fn run(&self, proof_id: ProofId, request: &ProofSubmission) -> DrpResult<SubmitResult> {
        let started = Instant::now();
        let timestamp = request.timestamp.unwrap_or_else(now);

        // 3. Consent.validate.
        let consent_ok = self
            .consent
            .validate(request.consent_token, &request.user_id)
            .await?;
        if !consent_ok {
            return Err(DrpError::ConsentDenied(format!(
                "token {} not valid for user",
                request.consent_token
            )));
        }

        // 4. user_hash = SHA-256(user_id).
        let user_hash = UserHash::of(&request.user_id);

        // 5. Build encrypted_activity_data via KeyVault (sensitive fields only).
        let encrypted_data = self.encrypt_sensitive_fields(&user_hash, &request.activity_data)?;

        // 6. Assemble Stored Proof Object.
        let metadata = request.metadata.clone().unwrap_or_else(|| Value::Map(BTreeMap::new()));
        let stored = StoredProofObject {
            proof_id,
            proof_type: request.proof_type.clone(),
            user_hash: user_hash.clone(),
            encrypted_data,
            encryption_metadata: EncryptionMetadata {
                algorithm: ENCRYPTION_ALGORITHM.to_string(),
                user_hash: user_hash.clone(),
                timestamp,
                version: ENCRYPTION_VERSION,
            },
            metadata: metadata.clone(),
            timestamp,
            consent_token_id: request.consent_token,
        };

        // 7. cid = ContentStore.put(canonical(stored_proof)).
        let bytes = canonical_bytes(&stored);
        let cid_str = self.content.put(bytes).await?;

        // 8. metadata_hash = SHA-256(canonical(metadata)).
        let metadata_hash = sha256_hex(&canonical_bytes(&metadata));

        // 9. MetadataIndex.insert(...).
        self.index
            .insert(MetadataRow {
                proof_id,
                user_hash: user_hash.clone(),
                cid: Cid(cid_str.clone()),
                proof_type: request.proof_type.clone(),
                metadata_hash: metadata_hash.clone(),
                timestamp,
                block_height: None,
                block_hash: None,
            })
            .await?;

        // 10. Schedule background anchoring (§4.7).
        let anchor = self.anchor.clone();
        let audit = self.audit.clone();
        let cid_for_anchor = Cid(cid_str.clone());
        tokio::spawn(async move {
            if let Err(e) = anchor
                .anchor(proof_id, cid_for_anchor, metadata_hash, timestamp)
                .await
            {
                let _ = audit
                    .log(
                        AuditEvent::new(EventType::AnchorError, Level::Error, e.to_string())
                            .with_data(json!({"proof_id": proof_id.to_string()})),
                    )
                    .await;
            } else {
                let _ = audit
                    .log(
                        AuditEvent::new(EventType::ProofAnchor, Level::Info, "proof anchored")
                            .with_data(json!({"proof_id": proof_id.to_string()})),
                    )
                    .await;
            }
        });

        // 11. Log PROOF_UPLOAD with duration.
        let duration_ms = started.elapsed().as_millis() as u64;
        let _ = self
            .audit
            .log(
                AuditEvent::new(EventType::ProofUpload, Level::Info, "proof uploaded")
                    .with_user(user_hash)
                    .with_data(json!({"proof_id": proof_id.to_string(), "cid": cid_str, "duration_ms": duration_ms})),
            )
            .await;

        // 12. Return {proof_id, cid, status="submitted"}.
        Ok(SubmitResult {
            proof_id,
            cid: cid_str,
            status: "submitted".to_string(),
            message: "proof accepted".to_string(),
            timestamp,
        })
    }

    fn encrypt_sensitive_fields(
        &self,
        user_hash: &UserHash,
        activity_data: &Value,
    ) -> DrpResult<BTreeMap<String, Value>> {
        let map = activity_data
            .as_map()
            .ok_or_else(|| DrpError::InvalidInput("activity_data must be an object".into()))?;
        let mut out = BTreeMap::new();
        for (field, value) in map {
            if is_sensitive_field(field) {
                let plaintext = canonical_bytes(value);
                let ciphertext = self.vault.encrypt_field(&user_hash.0, &plaintext)?;
                out.insert(format!("{field}_encrypted"), Value::String(ciphertext));
            } else {
                out.insert(field.clone(), value.clone());
            }
        }
        Ok(out)
    }
}
