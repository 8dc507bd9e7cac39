//! Production `MetadataIndex` over an embedded wide-column-shaped store,
//! using one sled tree per logical view.
//!
//! Named trees:
//!   proofs       — proof_id bytes                              → bincode(MetadataRow)
//!   cid_index    — cid utf8 bytes                               → proof_id bytes
//!   user_proofs  — user_hash || rev_ts(8) || proof_id(16)       → [] (membership)
//!   block_proofs — block_height(8, be) || rev_ts(8) || proof_id(16) → [] (membership)
//!
//! `user_proofs` and `block_proofs` are pointer tables: the canonical row
//! payload lives only in `proofs`. Keys encode `u64::MAX - timestamp` so a
//! lexicographic forward scan yields timestamp-descending order, with
//! `proof_id` ascending as the tie-break for equal timestamps (§4.5).

use crate::types::{IndexStats, MetadataRow, SearchFilter};
use crate::{floor_of_day, MetadataIndex};
use async_trait::async_trait;
use drp_core::{now, Cid, DrpError, DrpResult, ProofId, UserHash};
use std::collections::HashSet;
use std::path::Path;

pub struct SledMetadataIndex {
    _db: sled::Db,
    proofs: sled::Tree,
    cid_index: sled::Tree,
    user_proofs: sled::Tree,
    block_proofs: sled::Tree,
}

fn storage_err(e: sled::Error) -> DrpError {
    DrpError::StoreUnavailable(format!("metadata index: {e}"))
}

fn ser_err(e: bincode::Error) -> DrpError {
    DrpError::Internal(format!("metadata index serialization: {e}"))
}

fn rev_ts_bytes(timestamp: i64) -> [u8; 8] {
    (u64::MAX - timestamp as u64).to_be_bytes()
}

fn user_proofs_key(user_hash: &str, timestamp: i64, proof_id: ProofId) -> Vec<u8> {
    let mut key = user_hash.as_bytes().to_vec();
    key.push(0); // separator: user_hash is a fixed-length hex hash, but be explicit
    key.extend_from_slice(&rev_ts_bytes(timestamp));
    key.extend_from_slice(proof_id.as_uuid().as_bytes());
    key
}

fn block_proofs_key(block_height: u64, timestamp: i64, proof_id: ProofId) -> Vec<u8> {
    let mut key = block_height.to_be_bytes().to_vec();
    key.extend_from_slice(&rev_ts_bytes(timestamp));
    key.extend_from_slice(proof_id.as_uuid().as_bytes());
    key
}

fn proof_id_from_key_suffix(key: &[u8]) -> DrpResult<ProofId> {
    let len = key.len();
    if len < 16 {
        return Err(DrpError::Internal("index key too short for proof_id suffix".into()));
    }
    let bytes: [u8; 16] = key[len - 16..]
        .try_into()
        .map_err(|_| DrpError::Internal("index key proof_id suffix malformed".into()))?;
    Ok(ProofId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

impl SledMetadataIndex {
    pub fn open(path: impl AsRef<Path>) -> DrpResult<Self> {
        let db = sled::open(path).map_err(storage_err)?;
        let proofs = db.open_tree("proofs").map_err(storage_err)?;
        let cid_index = db.open_tree("cid_index").map_err(storage_err)?;
        let user_proofs = db.open_tree("user_proofs").map_err(storage_err)?;
        let block_proofs = db.open_tree("block_proofs").map_err(storage_err)?;
        Ok(Self {
            _db: db,
            proofs,
            cid_index,
            user_proofs,
            block_proofs,
        })
    }

    fn get_row(&self, proof_id: ProofId) -> DrpResult<Option<MetadataRow>> {
        match self.proofs.get(proof_id.as_uuid().as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    fn put_row(&self, row: &MetadataRow) -> DrpResult<()> {
        let bytes = bincode::serialize(row).map_err(ser_err)?;
        self.proofs
            .insert(row.proof_id.as_uuid().as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    fn rows_from_keys(&self, tree: &sled::Tree, prefix: &[u8], limit: usize) -> DrpResult<Vec<MetadataRow>> {
        let mut rows = Vec::new();
        for item in tree.scan_prefix(prefix) {
            if rows.len() >= limit {
                break;
            }
            let (key, _) = item.map_err(storage_err)?;
            let proof_id = proof_id_from_key_suffix(&key)?;
            if let Some(row) = self.get_row(proof_id)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl MetadataIndex for SledMetadataIndex {
    async fn insert(&self, row: MetadataRow) -> DrpResult<()> {
        self.put_row(&row)?;
        self.cid_index
            .insert(row.cid.0.as_bytes(), row.proof_id.as_uuid().as_bytes().to_vec())
            .map_err(storage_err)?;
        self.user_proofs
            .insert(
                user_proofs_key(&row.user_hash.0, row.timestamp, row.proof_id),
                vec![],
            )
            .map_err(storage_err)?;
        Ok(())
    }

    async fn record_anchor(
        &self,
        proof_id: ProofId,
        block_hash: String,
        block_height: u64,
    ) -> DrpResult<()> {
        let mut row = self
            .get_row(proof_id)?
            .ok_or_else(|| DrpError::NotFound("proof".into()))?;
        row.block_hash = Some(block_hash);
        row.block_height = Some(block_height);
        self.put_row(&row)?;
        self.block_proofs
            .insert(block_proofs_key(block_height, row.timestamp, proof_id), vec![])
            .map_err(storage_err)?;
        Ok(())
    }

    async fn by_cid(&self, cid: &Cid) -> DrpResult<Option<MetadataRow>> {
        match self.cid_index.get(cid.0.as_bytes()).map_err(storage_err)? {
            Some(bytes) => {
                let arr: [u8; 16] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| DrpError::Internal("cid_index value malformed".into()))?;
                let proof_id = ProofId::from_uuid(uuid::Uuid::from_bytes(arr));
                self.get_row(proof_id)
            }
            None => Ok(None),
        }
    }

    async fn by_proof_id(&self, proof_id: ProofId) -> DrpResult<Option<MetadataRow>> {
        self.get_row(proof_id)
    }

    async fn by_user(&self, user_hash: &UserHash, limit: usize) -> DrpResult<Vec<MetadataRow>> {
        let mut prefix = user_hash.0.as_bytes().to_vec();
        prefix.push(0);
        self.rows_from_keys(&self.user_proofs, &prefix, limit)
    }

    async fn by_block(&self, block_height: u64) -> DrpResult<Vec<MetadataRow>> {
        self.rows_from_keys(&self.block_proofs, &block_height.to_be_bytes(), usize::MAX)
    }

    async fn search(&self, filter: SearchFilter, limit: usize) -> DrpResult<Vec<MetadataRow>> {
        let t_lo = filter.t_lo.or_else(|| {
            if filter.user_hash.is_none() {
                Some(floor_of_day(now()))
            } else {
                None
            }
        });

        let candidates = if let Some(user_hash) = &filter.user_hash {
            self.by_user(user_hash, usize::MAX).await?
        } else {
            let mut all = Vec::new();
            for item in self.proofs.iter() {
                let (_, bytes) = item.map_err(storage_err)?;
                all.push(bincode::deserialize::<MetadataRow>(&bytes).map_err(ser_err)?);
            }
            all.sort_by(|a, b| {
                b.timestamp
                    .cmp(&a.timestamp)
                    .then_with(|| a.proof_id.as_uuid().cmp(&b.proof_id.as_uuid()))
            });
            all
        };

        let rows = candidates
            .into_iter()
            .filter(|r| filter.proof_type.as_ref().map_or(true, |t| &r.proof_type == t))
            .filter(|r| t_lo.map_or(true, |lo| r.timestamp >= lo))
            .filter(|r| filter.t_hi.map_or(true, |hi| r.timestamp <= hi))
            .take(limit)
            .collect();
        Ok(rows)
    }

    async fn stats(&self) -> DrpResult<IndexStats> {
        let total_proofs = self.proofs.len() as u64;
        let mut users = HashSet::new();
        let mut latest_block = None;
        for item in self.proofs.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            let row: MetadataRow = bincode::deserialize(&bytes).map_err(ser_err)?;
            users.insert(row.user_hash.0.clone());
            if let Some(h) = row.block_height {
                latest_block = Some(latest_block.map_or(h, |cur: u64| cur.max(h)));
            }
        }
        Ok(IndexStats {
            total_proofs,
            total_users: users.len() as u64,
            latest_block,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("drp-index-test-{tag}-{}", std::process::id()))
    }

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
    async fn insert_then_lookup_by_cid_and_user() {
        let path = temp_path("insert-lookup");
        let index = SledMetadataIndex::open(&path).unwrap();
        let id = ProofId::new();
        let r = row(id, "u1", 100);
        index.insert(r.clone()).await.unwrap();

        let by_cid = index.by_cid(&r.cid).await.unwrap().unwrap();
        assert_eq!(by_cid.proof_id, id);

        let by_user = index.by_user(&UserHash("u1".to_string()), 10).await.unwrap();
        assert_eq!(by_user.len(), 1);
        assert_eq!(by_user[0].proof_id, id);

        let _ = std::fs::remove_dir_all(&path);
    }

    #[tokio::test]
    async fn record_anchor_populates_block_view() {
        let path = temp_path("anchor");
        let index = SledMetadataIndex::open(&path).unwrap();
        let id = ProofId::new();
        index.insert(row(id, "u1", 50)).await.unwrap();
        assert!(index.by_block(7).await.unwrap().is_empty());
        index.record_anchor(id, "hash".into(), 7).await.unwrap();
        let by_block = index.by_block(7).await.unwrap();
        assert_eq!(by_block.len(), 1);
        assert_eq!(by_block[0].proof_id, id);
        let _ = std::fs::remove_dir_all(&path);
    }

    #[tokio::test]
    async fn by_user_orders_timestamp_desc_with_tiebreak() {
        let path = temp_path("order");
        let index = SledMetadataIndex::open(&path).unwrap();
        let a = ProofId::new();
        let b = ProofId::new();
        let (first, second) = if a.as_uuid() < b.as_uuid() { (a, b) } else { (b, a) };
        index.insert(row(first, "u1", 100)).await.unwrap();
        index.insert(row(second, "u1", 100)).await.unwrap();
        index.insert(row(ProofId::new(), "u1", 50)).await.unwrap();
        let rows = index.by_user(&UserHash("u1".to_string()), 10).await.unwrap();
        assert_eq!(rows[0].proof_id, first);
        assert_eq!(rows[1].proof_id, second);
        assert_eq!(rows[2].timestamp, 50);
        let _ = std::fs::remove_dir_all(&path);
    }
}
