use crate::types::{ElderInfo, ElderSignature, PersistedElder, QuorumStatus};
use drp_core::{jsonfile, now, DrpError, DrpResult, ElderId};
use drp_crypto::{verify, IdentityKeyPair, KeyScheme};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{info, warn};

struct Entry {
    info: ElderInfo,
    /// Only present for Elders whose secret this process generated at
    /// `bootstrap`. An Elder `add`ed with just a public key is a remote
    /// party: we can verify its signatures but never produce one on its
    /// behalf.
    keypair: Option<IdentityKeyPair>,
}

/// Key-share lifecycle and threshold signing/verification over anchor
/// payloads (C6). Elder order is insertion order, which is the
/// selection order `sign_payload` uses (§4.6).
pub struct ElderQuorum {
    keys_path: PathBuf,
    count_threshold: usize,
    entries: RwLock<Vec<Entry>>,
}

fn persisted_of(entries: &[Entry]) -> Vec<PersistedElder> {
    entries
        .iter()
        .map(|e| PersistedElder {
            info: e.info.clone(),
            secret_hex: e
                .keypair
                .as_ref()
                .and_then(|kp| kp.ed25519_secret_bytes())
                .map(hex::encode)
                .unwrap_or_default(),
        })
        .collect()
}

impl ElderQuorum {
    /// Loads the Elder keys file at `keys_path`, or bootstraps `n` fresh
    /// Ed25519 Elders (weight 1 each) and persists them if the file does
    /// not exist (`bootstrap(n)`, §4.6).
    pub fn open(keys_path: impl Into<PathBuf>, count_threshold: usize, n: usize) -> DrpResult<Self> {
        let keys_path = keys_path.into();
        let persisted: Vec<PersistedElder> = jsonfile::load(&keys_path)?.unwrap_or_default();

        let entries = if persisted.is_empty() {
            let mut fresh = Vec::with_capacity(n);
            for i in 0..n {
                let elder_id = ElderId(format!("elder-{}", i + 1));
                let keypair = IdentityKeyPair::generate(KeyScheme::Ed25519)?;
                let info = ElderInfo {
                    elder_id,
                    public_key: keypair.public_key.clone(),
                    weight: 1,
                    active: true,
                    revoked: false,
                    signature_count: 0,
                    last_seen: None,
                };
                fresh.push(Entry {
                    info,
                    keypair: Some(keypair),
                });
            }
            jsonfile::save(&keys_path, &persisted_of(&fresh))?;
            info!(count = fresh.len(), "bootstrapped Elder quorum");
            fresh
        } else {
            persisted
                .into_iter()
                .map(|p| {
                    let keypair = if p.secret_hex.is_empty() {
                        None
                    } else {
                        hex::decode(&p.secret_hex).ok().and_then(|bytes| {
                            let arr: [u8; 32] = bytes.try_into().ok()?;
                            Some(IdentityKeyPair::from_ed25519_secret_bytes(&arr))
                        })
                    };
                    Entry {
                        info: p.info,
                        keypair,
                    }
                })
                .collect()
        };

        Ok(Self {
            keys_path,
            count_threshold,
            entries: RwLock::new(entries),
        })
    }

    pub fn count_threshold(&self) -> usize {
        self.count_threshold
    }

    fn weight_threshold_of(entries: &[Entry]) -> u32 {
        let total: u32 = entries.iter().filter(|e| e.info.is_effective()).map(|e| e.info.weight).sum();
        total / 2 + 1
    }

    fn persist(&self, entries: &[Entry]) -> DrpResult<()> {
        jsonfile::save(&self.keys_path, &persisted_of(entries))
    }

    /// `add(elder_id, pk, weight=1)` (§4.6). Rejects a duplicate `elder_id`.
    pub async fn add(&self, elder_id: ElderId, public_key: Vec<u8>, weight: u32) -> DrpResult<()> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.info.elder_id == elder_id) {
            return Err(DrpError::Internal(format!("elder {elder_id} already exists")));
        }
        entries.push(Entry {
            info: ElderInfo {
                elder_id,
                public_key,
                weight,
                active: true,
                revoked: false,
                signature_count: 0,
                last_seen: None,
            },
            keypair: None,
        });
        self.persist(&entries)
    }

    /// `revoke(elder_id)`: terminal — no transition leads back out of
    /// `revoked` (§4.6 state diagram).
    pub async fn revoke(&self, elder_id: &ElderId) -> DrpResult<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| &e.info.elder_id == elder_id)
            .ok_or_else(|| DrpError::UnknownElder(elder_id.to_string()))?;
        entry.info.revoked = true;
        entry.info.active = false;
        self.persist(&entries)
    }

    /// `active --mark_inactive--> inactive` (§4.6 state diagram). A no-op
    /// on an Elder that is already revoked or inactive.
    pub async fn mark_inactive(&self, elder_id: &ElderId) -> DrpResult<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| &e.info.elder_id == elder_id)
            .ok_or_else(|| DrpError::UnknownElder(elder_id.to_string()))?;
        if entry.info.revoked {
            return Err(DrpError::RevokedElder(elder_id.to_string()));
        }
        entry.info.active = false;
        self.persist(&entries)
    }

    /// `inactive --reactivate--> active` (§4.6 state diagram).
    pub async fn reactivate(&self, elder_id: &ElderId) -> DrpResult<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| &e.info.elder_id == elder_id)
            .ok_or_else(|| DrpError::UnknownElder(elder_id.to_string()))?;
        if entry.info.revoked {
            return Err(DrpError::RevokedElder(elder_id.to_string()));
        }
        entry.info.active = true;
        self.persist(&entries)
    }

    /// `sign_payload(payload) → [ElderSignature]` (§4.6): selects the first
    /// `count_threshold` effective Elders this process holds a secret for,
    /// in insertion order, and signs `payload` (already canonically
    /// encoded by the caller) with each.
    pub async fn sign_payload(&self, payload: &[u8]) -> DrpResult<Vec<ElderSignature>> {
        let mut entries = self.entries.write().await;
        let signable_count = entries
            .iter()
            .filter(|e| e.info.is_effective() && e.keypair.is_some())
            .count();
        if signable_count < self.count_threshold {
            return Err(DrpError::InsufficientElders {
                need: self.count_threshold,
                have: signable_count,
            });
        }

        let mut signatures = Vec::with_capacity(self.count_threshold);
        let mut signed = 0usize;
        let ts = now();
        for entry in entries.iter_mut() {
            if signed >= self.count_threshold {
                break;
            }
            if !entry.info.is_effective() {
                continue;
            }
            let keypair = match &entry.keypair {
                Some(kp) => kp,
                None => continue,
            };
            let signature = keypair.sign(payload)?;
            signatures.push(ElderSignature {
                elder_id: entry.info.elder_id.clone(),
                signature,
                public_key: entry.info.public_key.clone(),
                weight: entry.info.weight,
                timestamp: ts,
            });
            entry.info.signature_count += 1;
            entry.info.last_seen = Some(ts);
            signed += 1;
        }
        self.persist(&entries)?;
        Ok(signatures)
    }

    /// `verify_payload(payload, sigs) → bool` (§4.6):
    /// 1. `|sigs|` distinct Elders `≥ t` or false.
    /// 2. Each `σ`: reject (skip) if signer not in `E_eff`, else verify.
    /// 3. `valid_weight ≥ W`.
    ///
    /// Signatures are deduplicated by `elder_id` before either gate is
    /// evaluated: the count threshold is defined over distinct participants
    /// (§4.6 rationale), so `t` copies of one Elder's signature must not
    /// satisfy it, and must not be double-counted into `valid_weight` either.
    pub async fn verify_payload(&self, payload: &[u8], sigs: &[ElderSignature]) -> DrpResult<bool> {
        let mut seen = std::collections::HashSet::new();
        let distinct: Vec<&ElderSignature> = sigs
            .iter()
            .filter(|sig| seen.insert(sig.elder_id.clone()))
            .collect();

        if distinct.len() < self.count_threshold {
            warn!(have = distinct.len(), need = self.count_threshold, "insufficient distinct signers");
            return Ok(false);
        }

        let entries = self.entries.read().await;
        let weight_threshold = Self::weight_threshold_of(&entries);

        let mut valid_weight: u64 = 0;
        for sig in distinct {
            let entry = match entries.iter().find(|e| e.info.elder_id == sig.elder_id) {
                Some(e) => e,
                None => {
                    warn!(elder_id = %sig.elder_id, "unknown elder in quorum signature");
                    continue;
                }
            };
            if !entry.info.is_effective() {
                warn!(elder_id = %sig.elder_id, "revoked or inactive elder in quorum signature");
                continue;
            }
            match verify(KeyScheme::Ed25519, &entry.info.public_key, payload, &sig.signature) {
                Ok(true) => valid_weight += entry.info.weight as u64,
                Ok(false) => warn!(elder_id = %sig.elder_id, "bad signature in quorum"),
                Err(e) => warn!(elder_id = %sig.elder_id, error = %e, "signature verification error"),
            }
        }

        Ok(valid_weight >= weight_threshold as u64)
    }

    /// `status()` (§4.6).
    pub async fn status(&self) -> QuorumStatus {
        let entries = self.entries.read().await;
        let total_elders = entries.len();
        let active_elders = entries.iter().filter(|e| e.info.is_effective()).count();
        let revoked_elders = entries.iter().filter(|e| e.info.revoked).count();
        let weight_threshold = Self::weight_threshold_of(&entries);
        QuorumStatus {
            total_elders,
            active_elders,
            revoked_elders,
            count_threshold: self.count_threshold,
            weight_threshold,
            elders: entries.iter().map(|e| e.info.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drp_core::canonical_bytes;
    use serde_json::json;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("drp-elders-test-{tag}-{}.json", std::process::id()))
    }

    #[tokio::test]
    async fn bootstrap_generates_and_persists_n_elders() {
        let path = temp_path("bootstrap");
        let _ = std::fs::remove_file(&path);
        let quorum = ElderQuorum::open(&path, 2, 3).unwrap();
        let status = quorum.status().await;
        assert_eq!(status.total_elders, 3);
        assert_eq!(status.active_elders, 3);
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn sign_and_verify_three_elders_two_of_three() {
        let path = temp_path("sign-verify");
        let _ = std::fs::remove_file(&path);
        let quorum = ElderQuorum::open(&path, 2, 3).unwrap();
        let payload = canonical_bytes(&json!({"proof_id": "p1", "cid": "c1"}));

        let sigs = quorum.sign_payload(&payload).await.unwrap();
        assert_eq!(sigs.len(), 2);
        assert!(quorum.verify_payload(&payload, &sigs).await.unwrap());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn revoking_below_threshold_yields_insufficient_elders() {
        let path = temp_path("revoke-insufficient");
        let _ = std::fs::remove_file(&path);
        let quorum = ElderQuorum::open(&path, 2, 3).unwrap();
        let status = quorum.status().await;
        let e1 = status.elders[0].elder_id.clone();
        let e2 = status.elders[1].elder_id.clone();

        quorum.revoke(&e1).await.unwrap();
        let payload = canonical_bytes(&json!({"x": 1}));
        let sigs = quorum.sign_payload(&payload).await.unwrap();
        assert_eq!(sigs.len(), 2);
        assert!(quorum.verify_payload(&payload, &sigs).await.unwrap());

        quorum.revoke(&e2).await.unwrap();
        let err = quorum.sign_payload(&payload).await.unwrap_err();
        assert!(matches!(err, DrpError::InsufficientElders { .. }));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn tampered_payload_fails_verification() {
        let path = temp_path("tamper");
        let _ = std::fs::remove_file(&path);
        let quorum = ElderQuorum::open(&path, 2, 3).unwrap();
        let payload = canonical_bytes(&json!({"proof_id": "p1"}));
        let sigs = quorum.sign_payload(&payload).await.unwrap();

        let tampered = canonical_bytes(&json!({"proof_id": "p2"}));
        assert!(!quorum.verify_payload(&tampered, &sigs).await.unwrap());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn duplicate_signatures_from_one_elder_do_not_satisfy_quorum() {
        let path = temp_path("dup-sig");
        let _ = std::fs::remove_file(&path);
        let quorum = ElderQuorum::open(&path, 2, 3).unwrap();
        let payload = canonical_bytes(&json!({"proof_id": "p1"}));
        let sigs = quorum.sign_payload(&payload).await.unwrap();
        assert_eq!(sigs.len(), 2);

        // `t` copies of a single real signature must not pass either the
        // count gate (distinct participants) or the weight gate.
        let duplicated = vec![sigs[0].clone(), sigs[0].clone()];
        assert!(!quorum.verify_payload(&payload, &duplicated).await.unwrap());

        let _ = std::fs::remove_file(&path);
    }
}
