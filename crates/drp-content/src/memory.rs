//! In-memory fake `ContentStore`, used by tests and by any caller that does
//! not want a live `IPFS_URL` endpoint (Design Notes §9: optional/mock
//! backends become an interface with a fake in-memory implementation).

use crate::{Cid, ContentStore, NodeInfo, PeerInfo};
use async_trait::async_trait;
use drp_core::{sha256_hex, DrpError, DrpResult};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<Cid, Vec<u8>>>,
    pins: RwLock<HashSet<Cid>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            pins: RwLock::new(HashSet::new()),
        }
    }

    /// Stable CID derivation: a content hash of the bytes, not registry
    /// assignment. Two identical submissions always yield the same CID
    /// (§8, invariant 2).
    fn cid_for(bytes: &[u8]) -> Cid {
        format!("bafy{}", sha256_hex(bytes))
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, bytes: Vec<u8>) -> DrpResult<Cid> {
        let cid = Self::cid_for(&bytes);
        self.blobs.write().unwrap().insert(cid.clone(), bytes);
        self.pins.write().unwrap().insert(cid.clone());
        Ok(cid)
    }

    async fn get(&self, cid: &str) -> DrpResult<Vec<u8>> {
        self.blobs
            .read()
            .unwrap()
            .get(cid)
            .cloned()
            .ok_or_else(|| DrpError::NotFound(format!("cid {cid}")))
    }

    async fn pin(&self, cid: &str) -> DrpResult<()> {
        if !self.blobs.read().unwrap().contains_key(cid) {
            return Err(DrpError::NotFound(format!("cid {cid}")));
        }
        self.pins.write().unwrap().insert(cid.to_string());
        Ok(())
    }

    async fn unpin(&self, cid: &str) -> DrpResult<()> {
        self.pins.write().unwrap().remove(cid);
        Ok(())
    }

    async fn list_pins(&self) -> DrpResult<Vec<Cid>> {
        Ok(self.pins.read().unwrap().iter().cloned().collect())
    }

    async fn node_info(&self) -> DrpResult<NodeInfo> {
        Ok(NodeInfo {
            id: "in-memory-fake".to_string(),
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
            addresses: vec!["/memory/0".to_string()],
        })
    }

    async fn peer_list(&self) -> DrpResult<Vec<PeerInfo>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_is_content_addressed_and_stable() {
        let store = InMemoryContentStore::new();
        let a = store.put(b"hello".to_vec()).await.unwrap();
        let b = store.put(b"hello".to_vec()).await.unwrap();
        assert_eq!(a, b);
        let c = store.put(b"other".to_vec()).await.unwrap();
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn get_unknown_cid_not_found() {
        let store = InMemoryContentStore::new();
        assert!(matches!(
            store.get("nonexistent").await,
            Err(DrpError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn put_pins_by_default() {
        let store = InMemoryContentStore::new();
        let cid = store.put(b"data".to_vec()).await.unwrap();
        assert!(store.list_pins().await.unwrap().contains(&cid));
        store.unpin(&cid).await.unwrap();
        assert!(!store.list_pins().await.unwrap().contains(&cid));
    }
}
