//! Wide-column index of `(proof_id, user_hash, cid, type, ts, block_height)`
//! with secondary views (C5, Metadata Index). Eventually consistent with the
//! content store and the ledger; it is the fast lookup layer, not the
//! source of truth for either (§4.5).

pub mod embedded;
pub mod memory;
pub mod types;

use async_trait::async_trait;
use drp_core::{Cid, DrpResult, ProofId, Timestamp, UserHash};
pub use types::{IndexStats, MetadataRow, SearchFilter};

pub use embedded::SledMetadataIndex;
pub use memory::InMemoryMetadataIndex;

/// Capability set the submission pipeline and read API depend on. Two
/// implementations are required (Design Notes §9): an in-memory fake
/// mirroring the four views, and a production implementation over an
/// embedded wide-column-shaped store.
#[async_trait]
pub trait MetadataIndex: Send + Sync {
    async fn insert(&self, row: MetadataRow) -> DrpResult<()>;

    /// Writes `block_height`/`block_hash` exactly once, per the Metadata
    /// Row lifecycle rule (§3); also lands a row in `block_proofs`.
    async fn record_anchor(
        &self,
        proof_id: ProofId,
        block_hash: String,
        block_height: u64,
    ) -> DrpResult<()>;

    async fn by_cid(&self, cid: &Cid) -> DrpResult<Option<MetadataRow>>;
    async fn by_proof_id(&self, proof_id: ProofId) -> DrpResult<Option<MetadataRow>>;
    async fn by_user(&self, user_hash: &UserHash, limit: usize) -> DrpResult<Vec<MetadataRow>>;
    async fn by_block(&self, block_height: u64) -> DrpResult<Vec<MetadataRow>>;
    async fn search(&self, filter: SearchFilter, limit: usize) -> DrpResult<Vec<MetadataRow>>;
    async fn stats(&self) -> DrpResult<IndexStats>;
}

/// Start of the current UTC day, in seconds since epoch — the safeguard
/// bound applied to a `user_hash`-free search (Design Notes §9).
pub fn floor_of_day(now: Timestamp) -> Timestamp {
    now - now.rem_euclid(86_400)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_of_day_truncates_to_midnight_utc() {
        // 2023-11-14T22:13:20Z
        let ts = 1_700_000_000;
        let floored = floor_of_day(ts);
        assert_eq!(floored, 1_699_920_000);
        assert!(floored <= ts);
        assert_eq!(floor_of_day(floored), floored);
    }
}
