//! Read API (C11, §4.11): lookup by CID, by user, by block, each folding in
//! on-chain anchor verification. Never returns plaintext sensitive fields —
//! decryption requires the per-user key and is out of scope of this path.

use crate::types::ReadProof;
use drp_anchor::AnchorService;
use drp_core::{Cid, DrpResult, UserHash};
use drp_index::MetadataIndex;
use std::sync::Arc;

pub struct ReadApi {
    index: Arc<dyn MetadataIndex>,
    anchor: Arc<AnchorService>,
}

impl ReadApi {
    pub fn new(index: Arc<dyn MetadataIndex>, anchor: Arc<AnchorService>) -> Self {
        Self { index, anchor }
    }

    /// `by_cid(cid)` (§4.11).
    pub async fn by_cid(&self, cid: &str) -> DrpResult<Option<ReadProof>> {
        let cid_key = Cid(cid.to_string());
        let row = match self.index.by_cid(&cid_key).await? {
            Some(r) => r,
            None => return Ok(None),
        };
        let is_verified = self.anchor.verify_cid_anchor(&cid_key).await.unwrap_or(false);
        Ok(Some(ReadProof {
            cid: row.cid.0,
            proof_type: row.proof_type,
            user_hash: row.user_hash,
            block_height: row.block_height,
            timestamp: row.timestamp,
            metadata_hash: row.metadata_hash,
            is_verified,
        }))
    }

    /// `by_user(user_hash, limit)` (§4.11).
    pub async fn by_user(&self, user_hash: &UserHash, limit: usize) -> DrpResult<Vec<ReadProof>> {
        let rows = self.index.by_user(user_hash, limit).await?;
        self.project_all(rows).await
    }

    /// `by_block(block_height)` (§4.11).
    pub async fn by_block(&self, block_height: u64) -> DrpResult<Vec<ReadProof>> {
        let rows = self.index.by_block(block_height).await?;
        self.project_all(rows).await
    }

    async fn project_all(&self, rows: Vec<drp_index::MetadataRow>) -> DrpResult<Vec<ReadProof>> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let is_verified = self.anchor.verify_cid_anchor(&row.cid).await.unwrap_or(false);
            out.push(ReadProof {
                cid: row.cid.0,
                proof_type: row.proof_type,
                user_hash: row.user_hash,
                block_height: row.block_height,
                timestamp: row.timestamp,
                metadata_hash: row.metadata_hash,
                is_verified,
            });
        }
        Ok(out)
    }
}
