//! Anchor Service (C7, §4.7): builds the anchor payload, collects Elder
//! quorum co-signatures, submits the resulting transaction to the ledger
//! with bounded retry, and notifies the metadata index.

use crate::ledger::Ledger;
use crate::types::{AnchorPayload, AnchorTransaction};
use drp_core::{canonical_bytes, Cid, DrpError, DrpResult, ProofId, Timestamp};
use drp_elders::ElderQuorum;
use drp_index::MetadataIndex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const MAX_SUBMIT_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

pub struct AnchorService {
    elders: Arc<ElderQuorum>,
    ledger: Arc<dyn Ledger>,
    index: Arc<dyn MetadataIndex>,
}

impl AnchorService {
    pub fn new(elders: Arc<ElderQuorum>, ledger: Arc<dyn Ledger>, index: Arc<dyn MetadataIndex>) -> Self {
        Self {
            elders,
            ledger,
            index,
        }
    }

    /// Runs the full anchor sequence for a proof (§4.7, steps 1-5).
    /// Idempotent with respect to `proof_id`: if the index already records a
    /// `block_hash` for it, that value is returned rather than re-signing.
    pub async fn anchor(
        &self,
        proof_id: ProofId,
        cid: Cid,
        metadata_hash: String,
        timestamp: Timestamp,
    ) -> DrpResult<(String, u64)> {
        if let Some(row) = self.index.by_proof_id(proof_id).await? {
            if let (Some(block_hash), Some(block_height)) = (row.block_hash, row.block_height) {
                info!(%proof_id, "anchor already recorded, skipping re-sign");
                return Ok((block_hash, block_height));
            }
        }

        let payload = AnchorPayload {
            proof_id,
            cid,
            metadata_hash,
            timestamp,
        };
        let payload_bytes = canonical_bytes(&payload);

        let elder_signatures = match self.elders.sign_payload(&payload_bytes).await {
            Ok(sigs) => sigs,
            Err(e) => {
                error!(%proof_id, error = %e, "elder quorum signing failed, anchor not submitted");
                return Err(e);
            }
        };

        let tx = AnchorTransaction {
            anchor_payload: payload,
            elder_signatures,
        };

        let (block_hash, block_height) = self.submit_with_retry(&tx).await?;

        self.index
            .record_anchor(proof_id, block_hash.clone(), block_height)
            .await?;

        info!(%proof_id, %block_hash, block_height, "proof anchored");
        Ok((block_hash, block_height))
    }

    /// Bounded exponential backoff: 3 attempts, doubling delays starting at
    /// 500 ms (§4.7).
    async fn submit_with_retry(&self, tx: &AnchorTransaction) -> DrpResult<(String, u64)> {
        let mut delay = Duration::from_millis(INITIAL_BACKOFF_MS);
        let mut last_err = DrpError::Internal("unreachable".into());
        for attempt in 1..=MAX_SUBMIT_ATTEMPTS {
            match self.ledger.anchor(tx).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!(attempt, error = %e, "ledger submission failed");
                    last_err = e;
                    if attempt < MAX_SUBMIT_ATTEMPTS {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }
        error!(proof_id = %tx.anchor_payload.proof_id, "ledger submission exhausted retries, abandoning anchor attempt");
        Err(last_err)
    }

    /// `verify_cid_anchor(cid)` (§4.7): the ledger's own digest check
    /// (internal record integrity) is necessary but not sufficient — it is
    /// a tautology against data the ledger stored itself. This also
    /// re-verifies the committed `elder_signatures` against the *current*
    /// Elder quorum state (§4.6, §8 Invariant 5), so a revoked signer or an
    /// under-threshold signature set fails verification even though the
    /// ledger's own record of it is internally consistent.
    pub async fn verify_cid_anchor(&self, cid: &Cid) -> DrpResult<bool> {
        if !self.ledger.verify(cid).await? {
            return Ok(false);
        }
        let Some(tx) = self.ledger.transaction(cid).await? else {
            return Ok(false);
        };
        let payload_bytes = canonical_bytes(&tx.anchor_payload);
        self.elders.verify_payload(&payload_bytes, &tx.elder_signatures).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::DigestLedger;
    use drp_index::InMemoryMetadataIndex;

    async fn quorum() -> Arc<ElderQuorum> {
        let path = std::env::temp_dir().join(format!(
            "drp-anchor-test-elders-{}.json",
            uuid::Uuid::new_v4()
        ));
        Arc::new(ElderQuorum::open(&path, 2, 3).unwrap())
    }

    #[tokio::test]
    async fn anchor_full_flow_records_block_in_index() {
        let elders = quorum().await;
        let ledger: Arc<dyn Ledger> = Arc::new(DigestLedger::new());
        let index: Arc<dyn MetadataIndex> = Arc::new(InMemoryMetadataIndex::new());

        let proof_id = ProofId::new();
        let cid = Cid("cid1".to_string());
        index
            .insert(drp_index::MetadataRow {
                proof_id,
                user_hash: drp_core::UserHash::of("alice"),
                cid: cid.clone(),
                proof_type: "PoST".to_string(),
                metadata_hash: "h".to_string(),
                timestamp: 1_700_000_000,
                block_height: None,
                block_hash: None,
            })
            .await
            .unwrap();

        let service = AnchorService::new(elders, ledger, index.clone());
        let (block_hash, height) = service
            .anchor(proof_id, cid.clone(), "h".to_string(), 1_700_000_000)
            .await
            .unwrap();
        assert_eq!(height, 1);

        let row = index.by_proof_id(proof_id).await.unwrap().unwrap();
        assert_eq!(row.block_hash, Some(block_hash));
        assert!(service.verify_cid_anchor(&cid).await.unwrap());
    }

    #[tokio::test]
    async fn anchoring_twice_is_idempotent() {
        let elders = quorum().await;
        let ledger: Arc<dyn Ledger> = Arc::new(DigestLedger::new());
        let index: Arc<dyn MetadataIndex> = Arc::new(InMemoryMetadataIndex::new());

        let proof_id = ProofId::new();
        let cid = Cid("cid1".to_string());
        index
            .insert(drp_index::MetadataRow {
                proof_id,
                user_hash: drp_core::UserHash::of("alice"),
                cid: cid.clone(),
                proof_type: "PoST".to_string(),
                metadata_hash: "h".to_string(),
                timestamp: 1_700_000_000,
                block_height: None,
                block_hash: None,
            })
            .await
            .unwrap();

        let service = AnchorService::new(elders, ledger, index);
        let first = service
            .anchor(proof_id, cid.clone(), "h".to_string(), 1_700_000_000)
            .await
            .unwrap();
        let second = service
            .anchor(proof_id, cid, "h".to_string(), 1_700_000_000)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn insufficient_elders_aborts_before_ledger_submit() {
        let elders = quorum().await;
        let status = elders.status().await;
        elders.revoke(&status.elders[0].elder_id).await.unwrap();
        elders.revoke(&status.elders[1].elder_id).await.unwrap();

        let ledger: Arc<dyn Ledger> = Arc::new(DigestLedger::new());
        let index: Arc<dyn MetadataIndex> = Arc::new(InMemoryMetadataIndex::new());
        let proof_id = ProofId::new();
        let service = AnchorService::new(elders, ledger, index);
        let err = service
            .anchor(proof_id, Cid("cid1".to_string()), "h".to_string(), 1_700_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, DrpError::InsufficientElders { .. }));
    }

    #[tokio::test]
    async fn verify_cid_anchor_fails_once_enough_signers_are_revoked() {
        let elders = quorum().await;
        let ledger: Arc<dyn Ledger> = Arc::new(DigestLedger::new());
        let index: Arc<dyn MetadataIndex> = Arc::new(InMemoryMetadataIndex::new());

        let proof_id = ProofId::new();
        let cid = Cid("cid1".to_string());
        index
            .insert(drp_index::MetadataRow {
                proof_id,
                user_hash: drp_core::UserHash::of("alice"),
                cid: cid.clone(),
                proof_type: "PoST".to_string(),
                metadata_hash: "h".to_string(),
                timestamp: 1_700_000_000,
                block_height: None,
                block_hash: None,
            })
            .await
            .unwrap();

        let service = AnchorService::new(elders.clone(), ledger, index);
        service
            .anchor(proof_id, cid.clone(), "h".to_string(), 1_700_000_000)
            .await
            .unwrap();
        assert!(service.verify_cid_anchor(&cid).await.unwrap());

        // Revoke the two Elders who actually co-signed the committed
        // transaction. The ledger's own digest check still passes (the
        // stored bytes are unchanged), but re-verifying the committed
        // signatures against current quorum state must now fail.
        let status = elders.status().await;
        for elder in &status.elders {
            elders.revoke(&elder.elder_id).await.unwrap();
        }
        assert!(!service.verify_cid_anchor(&cid).await.unwrap());
    }
}
