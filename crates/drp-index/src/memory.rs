//! In-memory fake `MetadataIndex`, used by tests (Design Notes §9).

use crate::types::{IndexStats, MetadataRow, SearchFilter};
use crate::{floor_of_day, MetadataIndex};
use async_trait::async_trait;
use drp_core::{now, Cid, DrpError, DrpResult, ProofId, UserHash};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct Rows {
    by_proof_id: HashMap<ProofId, MetadataRow>,
}

#[derive(Default)]
pub struct InMemoryMetadataIndex {
    rows: RwLock<Rows>,
}

impl InMemoryMetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Tie-break for equal timestamps within a partition: `proof_id` ascending
/// (§4.5).
fn sort_desc_ts(rows: &mut [MetadataRow]) {
    rows.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.proof_id.as_uuid().cmp(&b.proof_id.as_uuid()))
    });
}

#[async_trait]
impl MetadataIndex for InMemoryMetadataIndex {
    async fn insert(&self, row: MetadataRow) -> DrpResult<()> {
        let mut guard = self.rows.write().await;
        guard.by_proof_id.insert(row.proof_id, row);
        Ok(())
    }

    async fn record_anchor(
        &self,
        proof_id: ProofId,
        block_hash: String,
        block_height: u64,
    ) -> DrpResult<()> {
        let mut guard = self.rows.write().await;
        let row = guard
            .by_proof_id
            .get_mut(&proof_id)
            .ok_or_else(|| DrpError::NotFound("proof".into()))?;
        row.block_hash = Some(block_hash);
        row.block_height = Some(block_height);
        Ok(())
    }

    async fn by_cid(&self, cid: &Cid) -> DrpResult<Option<MetadataRow>> {
        let guard = self.rows.read().await;
        Ok(guard.by_proof_id.values().find(|r| &r.cid == cid).cloned())
    }

    async fn by_proof_id(&self, proof_id: ProofId) -> DrpResult<Option<MetadataRow>> {
        let guard = self.rows.read().await;
        Ok(guard.by_proof_id.get(&proof_id).cloned())
    }

    async fn by_user(&self, user_hash: &UserHash, limit: usize) -> DrpResult<Vec<MetadataRow>> {
        let guard = self.rows.read().await;
        let mut rows: Vec<MetadataRow> = guard
            .by_proof_id
            .values()
            .filter(|r| &r.user_hash == user_hash)
            .cloned()
            .collect();
        sort_desc_ts(&mut rows);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn by_block(&self, block_height: u64) -> DrpResult<Vec<MetadataRow>> {
        let guard = self.rows.read().await;
        let mut rows: Vec<MetadataRow> = guard
            .by_proof_id
            .values()
            .filter(|r| r.block_height == Some(block_height))
            .cloned()
            .collect();
        sort_desc_ts(&mut rows);
        Ok(rows)
    }

    async fn search(&self, filter: SearchFilter, limit: usize) -> DrpResult<Vec<MetadataRow>> {
        let guard = self.rows.read().await;
        let t_lo = filter.t_lo.or_else(|| {
            if filter.user_hash.is_none() {
                Some(floor_of_day(now()))
            } else {
                None
            }
        });
        let mut rows: Vec<MetadataRow> = guard
            .by_proof_id
            .values()
            .filter(|r| filter.user_hash.as_ref().map_or(true, |u| &r.user_hash == u))
            .filter(|r| filter.proof_type.as_ref().map_or(true, |t| &r.proof_type == t))
            .filter(|r| t_lo.map_or(true, |lo| r.timestamp >= lo))
            .filter(|r| filter.t_hi.map_or(true, |hi| r.timestamp <= hi))
            .cloned()
            .collect();
        sort_desc_ts(&mut rows);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn stats(&self) -> DrpResult<IndexStats> {
        let guard = self.rows.read().await;
        let total_proofs = guard.by_proof_id.len() as u64;
        let total_users = guard
            .by_proof_id
            .values()
            .map(|r| r.user_hash.clone())
            .collect::<HashSet<_>>()
            .len() as u64;
        let latest_block = guard.by_proof_id.values().filter_map(|r| r.block_height).max();
        Ok(IndexStats {
            total_proofs,
            total_users,
            latest_block,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drp_core::ProofId;

    fn row(proof_id: ProofId, user_hash: &str, ts: i64) -> MetadataRow {
        MetadataRow {
            proof_id,
            user_hash: UserHash(user_hash.to_string()),
            cid: Cid(format!("cid-{proof_id}")),
            proof_type: "PoST".to_string(),
            metadata_hash: "hash".to_string(),
            timestamp: ts,
            block_height: None,
            block_hash: None,
        }
    }

    #[tokio::test]
    async fn by_user_orders_desc_with_proof_id_tiebreak() {
        let index = InMemoryMetadataIndex::new();
        let a = ProofId::new();
        let b = ProofId::new();
        let (first, second) = if a.as_uuid() < b.as_uuid() { (a, b) } else { (b, a) };
        index.insert(row(first, "u1", 100)).await.unwrap();
        index.insert(row(second, "u1", 100)).await.unwrap();
        let rows = index.by_user(&UserHash("u1".to_string()), 10).await.unwrap();
        assert_eq!(rows[0].proof_id, first);
        assert_eq!(rows[1].proof_id, second);
    }

    #[tokio::test]
    async fn record_anchor_updates_block_fields_once() {
        let index = InMemoryMetadataIndex::new();
        let id = ProofId::new();
        index.insert(row(id, "u1", 1)).await.unwrap();
        assert!(index.by_proof_id(id).await.unwrap().unwrap().block_height.is_none());
        index.record_anchor(id, "hash".into(), 5).await.unwrap();
        let after = index.by_proof_id(id).await.unwrap().unwrap();
        assert_eq!(after.block_height, Some(5));
        assert_eq!(after.block_hash.as_deref(), Some("hash"));
    }

    #[tokio::test]
    async fn search_without_user_is_bounded_by_day_floor() {
        let index = InMemoryMetadataIndex::new();
        let old = row(ProofId::new(), "u1", 0);
        index.insert(old).await.unwrap();
        let results = index.search(SearchFilter::default(), 100).await.unwrap();
        assert!(results.is_empty());
    }
}
