use drp_core::{Cid, ProofId, Timestamp};
use drp_elders::ElderSignature;
use serde::{Deserialize, Serialize};

/// The message input to Elder signatures (§3, §4.7). Canonical encoding of
/// this struct is what `ElderQuorum::sign_payload`/`verify_payload` sign and
/// check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorPayload {
    pub proof_id: ProofId,
    pub cid: Cid,
    pub metadata_hash: String,
    pub timestamp: Timestamp,
}

/// A committed ledger transaction: the anchor payload plus the quorum
/// signatures that authorized it (§4.7, step 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorTransaction {
    pub anchor_payload: AnchorPayload,
    pub elder_signatures: Vec<ElderSignature>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockInfo {
    pub block_hash: String,
    pub block_height: u64,
    pub timestamp: Timestamp,
    pub cids: Vec<Cid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainInfo {
    pub latest_block_height: u64,
    pub total_blocks: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnchorHistoryEntry {
    pub block_height: u64,
    pub block_hash: String,
    pub timestamp: Timestamp,
    pub cid_count: usize,
}

/// `estimate_cost` response (§4.7, supplemental). The digest ledger has no
/// real fee market; it reports a deterministic size-based estimate so the
/// interface shape matches a production chain client.
#[derive(Debug, Clone, Serialize)]
pub struct CostEstimate {
    pub estimated_fee_units: u64,
    pub payload_bytes: usize,
}
