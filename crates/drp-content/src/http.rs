//! Production `ContentStore` over a plain HTTP content-addressed store
//! endpoint (`IPFS_URL`, §6). Talks the IPFS HTTP API shape: multipart
//! upload to `/api/v0/add`, `GET /api/v0/cat?arg=<cid>`, and the
//! corresponding `pin/add`, `pin/rm`, `pin/ls` and `id`/`swarm/peers` routes
//! for observability.

use crate::{Cid, ContentStore, NodeInfo, PeerInfo};
use async_trait::async_trait;
use drp_core::{DrpError, DrpResult};
use std::time::Duration;

/// Default suspension-point timeout for content-store calls (§5).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpContentStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpContentStore {
    pub fn new(base_url: impl Into<String>) -> DrpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| DrpError::Internal(format!("building content-store client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn store_unavailable(e: reqwest::Error) -> DrpError {
        DrpError::StoreUnavailable(format!("content store: {e}"))
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn put(&self, bytes: Vec<u8>) -> DrpResult<Cid> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name("proof.json");
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .client
            .post(self.url("/api/v0/add"))
            .multipart(form)
            .send()
            .await
            .map_err(Self::store_unavailable)?;
        let body: serde_json::Value = resp.json().await.map_err(Self::store_unavailable)?;
        body.get("Hash")
            .and_then(|h| h.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| DrpError::StoreUnavailable("content store: missing Hash in response".into()))
    }

    async fn get(&self, cid: &str) -> DrpResult<Vec<u8>> {
        let resp = self
            .client
            .post(self.url(&format!("/api/v0/cat?arg={cid}")))
            .send()
            .await
            .map_err(Self::store_unavailable)?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DrpError::NotFound(format!("cid {cid}")));
        }
        if !resp.status().is_success() {
            return Err(DrpError::StoreUnavailable(format!(
                "content store returned {}",
                resp.status()
            )));
        }
        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(Self::store_unavailable)
    }

    async fn pin(&self, cid: &str) -> DrpResult<()> {
        self.client
            .post(self.url(&format!("/api/v0/pin/add?arg={cid}")))
            .send()
            .await
            .map_err(Self::store_unavailable)?;
        Ok(())
    }

    async fn unpin(&self, cid: &str) -> DrpResult<()> {
        self.client
            .post(self.url(&format!("/api/v0/pin/rm?arg={cid}")))
            .send()
            .await
            .map_err(Self::store_unavailable)?;
        Ok(())
    }

    async fn list_pins(&self) -> DrpResult<Vec<Cid>> {
        let resp = self
            .client
            .post(self.url("/api/v0/pin/ls"))
            .send()
            .await
            .map_err(Self::store_unavailable)?;
        let body: serde_json::Value = resp.json().await.map_err(Self::store_unavailable)?;
        let keys = body
            .get("Keys")
            .and_then(|k| k.as_object())
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        Ok(keys)
    }

    async fn node_info(&self) -> DrpResult<NodeInfo> {
        let resp = self
            .client
            .post(self.url("/api/v0/id"))
            .send()
            .await
            .map_err(Self::store_unavailable)?;
        let body: serde_json::Value = resp.json().await.map_err(Self::store_unavailable)?;
        Ok(NodeInfo {
            id: body.get("ID").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            agent_version: body
                .get("AgentVersion")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            addresses: body
                .get("Addresses")
                .and_then(|v| v.as_array())
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
        })
    }

    async fn peer_list(&self) -> DrpResult<Vec<PeerInfo>> {
        let resp = self
            .client
            .post(self.url("/api/v0/swarm/peers"))
            .send()
            .await
            .map_err(Self::store_unavailable)?;
        let body: serde_json::Value = resp.json().await.map_err(Self::store_unavailable)?;
        let peers = body
            .get("Peers")
            .and_then(|v| v.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|p| {
                        Some(PeerInfo {
                            peer_id: p.get("Peer")?.as_str()?.to_string(),
                            address: p.get("Addr").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(peers)
    }
}
