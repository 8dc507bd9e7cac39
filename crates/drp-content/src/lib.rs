//! Upload/retrieve/pin content-addressed blobs (C4, Content Store Client).
//!
//! The core treats the store as best-effort durable; it never assumes the
//! store is transactional with the index (§4.4). Two implementations are
//! required: an in-memory fake used by tests, and a production client over
//! an HTTP content-addressed store endpoint configured via `IPFS_URL`.

pub mod memory;
pub mod http;

use async_trait::async_trait;
use drp_core::DrpResult;
use serde::{Deserialize, Serialize};

/// Content identifier returned by the store; treated as an opaque string
/// everywhere outside this crate.
pub type Cid = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: String,
    pub agent_version: String,
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInfo {
    pub peer_id: String,
    pub address: String,
}

/// Capability set for a content-addressed object store. `put` uploads and
/// pins by default; the returned CID is a stable function of the input
/// bytes (§8, invariant 2).
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, bytes: Vec<u8>) -> DrpResult<Cid>;
    async fn get(&self, cid: &str) -> DrpResult<Vec<u8>>;
    async fn pin(&self, cid: &str) -> DrpResult<()>;
    async fn unpin(&self, cid: &str) -> DrpResult<()>;
    async fn list_pins(&self) -> DrpResult<Vec<Cid>>;
    async fn node_info(&self) -> DrpResult<NodeInfo>;
    async fn peer_list(&self) -> DrpResult<Vec<PeerInfo>>;
}

pub use http::HttpContentStore;
pub use memory::InMemoryContentStore;
