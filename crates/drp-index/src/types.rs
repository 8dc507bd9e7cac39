use drp_core::{Cid, ProofId, Timestamp, UserHash};
use serde::{Deserialize, Serialize};

/// One logical row, conceptually projected into four views: `proofs` (PK
/// `proof_id`), `user_proofs` (by `user_hash`, ts desc), `cid_index` (PK
/// `cid`), and `block_proofs` (by `block_height`, ts desc) — §4.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub proof_id: ProofId,
    pub user_hash: UserHash,
    pub cid: Cid,
    pub proof_type: String,
    pub metadata_hash: String,
    pub timestamp: Timestamp,
    pub block_height: Option<u64>,
    pub block_hash: Option<String>,
}

impl MetadataRow {
    pub fn is_anchored(&self) -> bool {
        self.block_height.is_some()
    }
}

/// Filter set for `search()` (§4.5). A `user_hash`-free search is bounded
/// by the index itself to a floor-of-day timestamp (Design Notes §9) to
/// guard against full-table scans; `proof_type` and explicit `t_lo`/`t_hi`
/// remain applicable as additional filters regardless.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub user_hash: Option<UserHash>,
    pub proof_type: Option<String>,
    pub t_lo: Option<Timestamp>,
    pub t_hi: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_proofs: u64,
    pub total_users: u64,
    pub latest_block: Option<u64>,
}
