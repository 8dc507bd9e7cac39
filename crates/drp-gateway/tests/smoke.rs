//! End-to-end smoke test for drp-gateway.
//!
//! Starts a real gateway process against a fresh data directory, issues a
//! consent token directly through the library (the HTTP surface has no
//! consent-issuance route, §6), submits a proof over HTTP, and asserts the
//! explorer and stats routes reflect it.
//!
//! Run with:
//!   cargo test -p drp-gateway --test smoke

use std::collections::BTreeSet;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::json;

struct GatewayGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for GatewayGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

async fn wait_for_health(client: &reqwest::Client, base: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.get(format!("{base}/health")).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    false
}

#[tokio::test]
async fn smoke_submit_and_read_back() {
    let data_dir = std::env::temp_dir().join(format!("drp_gateway_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    // Issue a consent token for "alice" directly through the library,
    // persisted to the same files the gateway process will open.
    let consent_db = data_dir.join("consent_tokens.json");
    let consent_key = data_dir.join("consent_key.raw");
    let token_id = {
        let svc = drp_consent::ConsentService::open(&consent_db, &consent_key).unwrap();
        let types: BTreeSet<String> = ["post_submission".to_string()].into_iter().collect();
        svc.create("alice", types, None).await.unwrap()
    };

    let http_port = free_port();
    let http_addr = format!("127.0.0.1:{http_port}");
    let base_url = format!("http://{http_addr}");

    let bin = env!("CARGO_BIN_EXE_drp-gateway");
    let child = Command::new(bin)
        .args([
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--http-addr",
            &http_addr,
            "--consent-db-file",
            consent_db.to_str().unwrap(),
            "--consent-private-key-file",
            consent_key.to_str().unwrap(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn drp-gateway");

    let _guard = GatewayGuard { child, data_dir };

    let http = reqwest::Client::new();
    assert!(
        wait_for_health(&http, &base_url, Duration::from_secs(20)).await,
        "drp-gateway did not become healthy within 20 seconds"
    );

    // Submit a proof (S1-shaped request).
    let submit_resp = http
        .post(format!("{base_url}/submit-proof"))
        .json(&json!({
            "proof_type": "PoST",
            "user_id": "alice",
            "activity_data": {"score": 42, "personal_data": {"name": "A"}},
            "consent_token": token_id.to_string(),
            "timestamp": 1_700_000_000,
            "metadata": {"k": "v"}
        }))
        .send()
        .await
        .unwrap();
    assert!(submit_resp.status().is_success(), "submit-proof failed: {:?}", submit_resp.status());
    let submit_body: serde_json::Value = submit_resp.json().await.unwrap();
    let cid = submit_body["cid"].as_str().unwrap().to_string();
    assert!(!cid.is_empty());
    assert_eq!(submit_body["status"], "submitted");

    // Read it back by CID; anchoring is async so is_verified may lag, but
    // the row must be present immediately.
    let explorer_resp = http.get(format!("{base_url}/explorer/{cid}")).send().await.unwrap();
    assert!(explorer_resp.status().is_success());
    let explorer_body: serde_json::Value = explorer_resp.json().await.unwrap();
    assert_eq!(explorer_body["proof_type"], "PoST");
    assert_eq!(explorer_body["timestamp"], 1_700_000_000);

    // Poll until the background anchor completes and is_verified flips true.
    let mut verified = false;
    for _ in 0..50 {
        let resp = http.get(format!("{base_url}/explorer/{cid}")).send().await.unwrap();
        let body: serde_json::Value = resp.json().await.unwrap();
        if body["is_verified"].as_bool() == Some(true) {
            verified = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(verified, "anchor never completed in time");

    // Stats should now report at least one proof.
    let stats_resp = http.get(format!("{base_url}/stats")).send().await.unwrap();
    assert!(stats_resp.status().is_success());
    let stats_body: serde_json::Value = stats_resp.json().await.unwrap();
    assert!(stats_body["total_proofs"].as_u64().unwrap() >= 1);

    // Submitting with an unknown consent token is rejected with 403.
    let denied_resp = http
        .post(format!("{base_url}/submit-proof"))
        .json(&json!({
            "proof_type": "PoST",
            "user_id": "mallory",
            "activity_data": {"score": 1},
            "consent_token": uuid::Uuid::new_v4().to_string(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(denied_resp.status(), reqwest::StatusCode::FORBIDDEN);
}
