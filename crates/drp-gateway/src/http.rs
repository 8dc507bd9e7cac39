//! HTTP surface (§6): a thin `axum` adapter over the core components. Every
//! handler is a direct call into the corresponding component through the
//! [`AppState`] application handle — no business logic lives here.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use drp_core::UserHash;
use drp_pipeline::ProofSubmission;

use crate::app::AppState;
use crate::errors::ApiError;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/submit-proof", post(submit_proof))
        .route("/explorer/:cid", get(explorer_by_cid))
        .route("/explorer/user/:user_hash", get(explorer_by_user))
        .route("/explorer/block/:height", get(explorer_by_block))
        .route("/stats", get(stats))
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let content_store = state.content.node_info().await.is_ok();
    let index = state.index.stats().await.is_ok();
    let ledger = state.ledger.chain_info().await.is_ok();
    let quorum = state.elders.status().await;
    let elders = quorum.active_elders >= quorum.count_threshold;

    let status = if content_store && index && ledger && elders {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "timestamp": drp_core::now(),
        "services": {
            "content_store": content_store,
            "index": index,
            "ledger": ledger,
            "elders": elders,
        }
    }))
}

async fn submit_proof(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProofSubmission>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.pipeline.submit(request).await?;
    Ok(Json(json!({
        "proof_id": result.proof_id.to_string(),
        "cid": result.cid,
        "status": result.status,
        "message": result.message,
        "timestamp": result.timestamp,
    })))
}

async fn explorer_by_cid(
    State(state): State<Arc<AppState>>,
    Path(cid): Path<String>,
) -> Result<Response, ApiError> {
    match state.read_api.by_cid(&cid).await? {
        Some(proof) => Ok(Json(proof).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Json(json!({"error": "cid not found"}))).into_response()),
    }
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

const DEFAULT_LIST_LIMIT: usize = 50;

async fn explorer_by_user(
    State(state): State<Arc<AppState>>,
    Path(user_hash): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_hash = UserHash(user_hash);
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let proofs = state.read_api.by_user(&user_hash, limit).await?;
    Ok(Json(json!({
        "user_hash": user_hash.0,
        "count": proofs.len(),
        "proofs": proofs,
    })))
}

async fn explorer_by_block(
    State(state): State<Arc<AppState>>,
    Path(height): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let proofs = state.read_api.by_block(height).await?;
    Ok(Json(json!({
        "block_height": height,
        "count": proofs.len(),
        "proofs": proofs,
    })))
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let index_stats = state.index.stats().await?;
    let chain_info = state.ledger.chain_info().await?;
    let quorum = state.elders.status().await;

    Ok(Json(json!({
        "total_proofs": index_stats.total_proofs,
        "total_users": index_stats.total_users,
        "latest_block": index_stats.latest_block,
        "system_health": {
            "active_elders": quorum.active_elders,
            "total_elders": quorum.total_elders,
            "weight_threshold": quorum.weight_threshold,
            "latest_block_height": chain_info.latest_block_height,
            "total_blocks": chain_info.total_blocks,
        }
    })))
}
