use crate::types::{AnchorHistoryEntry, AnchorTransaction, BlockInfo, ChainInfo, CostEstimate};
use async_trait::async_trait;
use drp_core::{Cid, DrpResult};

/// Pluggable ledger backend (§4.7, §9 Design Notes). The only implementation
/// shipped here, [`crate::digest::DigestLedger`], computes a deterministic
/// digest and never performs a real chain submission — a real
/// chain-submission backend is out of scope of the core.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Submits `tx` and returns `(block_hash, block_height)`.
    async fn anchor(&self, tx: &AnchorTransaction) -> DrpResult<(String, u64)>;

    /// Queries the ledger for the commitment containing `cid`, recomputes
    /// the expected block-hash from retrieved data, and compares.
    async fn verify(&self, cid: &Cid) -> DrpResult<bool>;

    /// Returns the committed transaction for `cid`, if any. Lets a caller
    /// re-verify the quorum signatures it carries against live Elder state
    /// rather than trusting the ledger's own record of them.
    async fn transaction(&self, cid: &Cid) -> DrpResult<Option<AnchorTransaction>>;

    async fn block_info(&self, block_hash: &str) -> DrpResult<Option<BlockInfo>>;
    async fn chain_info(&self) -> DrpResult<ChainInfo>;
    async fn anchor_history(
        &self,
        start: Option<u64>,
        end: Option<u64>,
        limit: usize,
    ) -> DrpResult<Vec<AnchorHistoryEntry>>;
    async fn estimate_cost(&self, tx: &AnchorTransaction) -> DrpResult<CostEstimate>;
}
