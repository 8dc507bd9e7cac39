use drp_core::{ConsentTokenId, ProofId, Timestamp, UserHash, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Client-visible request to `SubmissionPipeline::submit` (§3, §6
/// `POST /submit-proof`).
#[derive(Debug, Clone, Deserialize)]
pub struct ProofSubmission {
    pub proof_type: String,
    pub user_id: String,
    pub activity_data: Value,
    pub consent_token: ConsentTokenId,
    pub timestamp: Option<Timestamp>,
    pub metadata: Option<Value>,
}

/// Header block carried alongside a proof's encrypted fields (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    pub algorithm: String,
    pub user_hash: UserHash,
    pub timestamp: Timestamp,
    pub version: u32,
}

/// What the content store actually holds (§3, "Stored Proof Object").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProofObject {
    pub proof_id: ProofId,
    pub proof_type: String,
    pub user_hash: UserHash,
    pub encrypted_data: BTreeMap<String, Value>,
    pub encryption_metadata: EncryptionMetadata,
    pub metadata: Value,
    pub timestamp: Timestamp,
    pub consent_token_id: ConsentTokenId,
}

/// `submit` response (§4.9, step 12).
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResult {
    pub proof_id: ProofId,
    pub cid: String,
    pub status: String,
    pub message: String,
    pub timestamp: Timestamp,
}

/// `by_cid`/`by_user`/`by_block` read-path projection (§4.11).
#[derive(Debug, Clone, Serialize)]
pub struct ReadProof {
    pub cid: String,
    pub proof_type: String,
    pub user_hash: UserHash,
    pub block_height: Option<u64>,
    pub timestamp: Timestamp,
    pub metadata_hash: String,
    pub is_verified: bool,
}
