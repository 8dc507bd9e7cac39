//! Default [`Ledger`] implementation: computes the "block hash" as
//! `SHA-256(canonical(tx))` and never performs a real chain submission
//! (§4.7, §9 Design Notes — the original's anchoring path is ambiguous about
//! whether it ever builds real ledger transactions; this is the resolution).

use crate::ledger::Ledger;
use crate::types::{AnchorHistoryEntry, AnchorTransaction, BlockInfo, ChainInfo, CostEstimate};
use async_trait::async_trait;
use drp_core::{canonical_bytes, now, sha256_hex, Cid, DrpResult};
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Block {
    tx: AnchorTransaction,
    block_hash: String,
    block_height: u64,
    timestamp: i64,
}

#[derive(Default)]
struct State {
    blocks: Vec<Block>,
    by_cid: HashMap<Cid, usize>,
}

pub struct DigestLedger {
    state: RwLock<State>,
}

impl DigestLedger {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }
}

impl Default for DigestLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for DigestLedger {
    async fn anchor(&self, tx: &AnchorTransaction) -> DrpResult<(String, u64)> {
        let block_hash = sha256_hex(&canonical_bytes(tx));
        let mut state = self.state.write().await;
        let block_height = state.blocks.len() as u64 + 1;
        let index = state.blocks.len();
        state.by_cid.insert(tx.anchor_payload.cid.clone(), index);
        state.blocks.push(Block {
            tx: tx.clone(),
            block_hash: block_hash.clone(),
            block_height,
            timestamp: now(),
        });
        Ok((block_hash, block_height))
    }

    async fn verify(&self, cid: &Cid) -> DrpResult<bool> {
        let state = self.state.read().await;
        let Some(&index) = state.by_cid.get(cid) else {
            return Ok(false);
        };
        let block = &state.blocks[index];
        let expected = sha256_hex(&canonical_bytes(&block.tx));
        Ok(expected == block.block_hash)
    }

    async fn transaction(&self, cid: &Cid) -> DrpResult<Option<AnchorTransaction>> {
        let state = self.state.read().await;
        Ok(state.by_cid.get(cid).map(|&index| state.blocks[index].tx.clone()))
    }

    async fn block_info(&self, block_hash: &str) -> DrpResult<Option<BlockInfo>> {
        let state = self.state.read().await;
        Ok(state
            .blocks
            .iter()
            .find(|b| b.block_hash == block_hash)
            .map(|b| BlockInfo {
                block_hash: b.block_hash.clone(),
                block_height: b.block_height,
                timestamp: b.timestamp,
                cids: vec![b.tx.anchor_payload.cid.clone()],
            }))
    }

    async fn chain_info(&self) -> DrpResult<ChainInfo> {
        let state = self.state.read().await;
        Ok(ChainInfo {
            latest_block_height: state.blocks.last().map(|b| b.block_height).unwrap_or(0),
            total_blocks: state.blocks.len() as u64,
        })
    }

    async fn anchor_history(
        &self,
        start: Option<u64>,
        end: Option<u64>,
        limit: usize,
    ) -> DrpResult<Vec<AnchorHistoryEntry>> {
        let state = self.state.read().await;
        let entries = state
            .blocks
            .iter()
            .filter(|b| start.map(|s| b.block_height >= s).unwrap_or(true))
            .filter(|b| end.map(|e| b.block_height <= e).unwrap_or(true))
            .rev()
            .take(limit)
            .map(|b| AnchorHistoryEntry {
                block_height: b.block_height,
                block_hash: b.block_hash.clone(),
                timestamp: b.timestamp,
                cid_count: 1,
            })
            .collect();
        Ok(entries)
    }

    async fn estimate_cost(&self, tx: &AnchorTransaction) -> DrpResult<CostEstimate> {
        let bytes = canonical_bytes(tx);
        Ok(CostEstimate {
            estimated_fee_units: bytes.len() as u64,
            payload_bytes: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnchorPayload;

    fn tx(cid: &str) -> AnchorTransaction {
        AnchorTransaction {
            anchor_payload: AnchorPayload {
                proof_id: drp_core::ProofId::new(),
                cid: Cid(cid.to_string()),
                metadata_hash: "h".to_string(),
                timestamp: 1_700_000_000,
            },
            elder_signatures: vec![],
        }
    }

    #[tokio::test]
    async fn anchor_then_verify_succeeds() {
        let ledger = DigestLedger::new();
        let (block_hash, height) = ledger.anchor(&tx("c1")).await.unwrap();
        assert_eq!(height, 1);
        assert!(!block_hash.is_empty());
        assert!(ledger.verify(&Cid("c1".to_string())).await.unwrap());
    }

    #[tokio::test]
    async fn verify_unknown_cid_is_false() {
        let ledger = DigestLedger::new();
        ledger.anchor(&tx("c1")).await.unwrap();
        assert!(!ledger.verify(&Cid("unknown".to_string())).await.unwrap());
    }

    #[tokio::test]
    async fn chain_info_tracks_height() {
        let ledger = DigestLedger::new();
        ledger.anchor(&tx("c1")).await.unwrap();
        ledger.anchor(&tx("c2")).await.unwrap();
        let info = ledger.chain_info().await.unwrap();
        assert_eq!(info.latest_block_height, 2);
        assert_eq!(info.total_blocks, 2);
    }
}
