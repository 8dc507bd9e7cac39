//! Maps the typed error taxonomy (§7) onto HTTP status codes. The only
//! translation step between core errors and the wire; no business logic.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use drp_core::DrpError;
use serde_json::json;

pub struct ApiError(pub DrpError);

impl From<DrpError> for ApiError {
    fn from(e: DrpError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DrpError::ConsentDenied(_) => StatusCode::FORBIDDEN,
            DrpError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DrpError::NotFound(_) => StatusCode::NOT_FOUND,
            DrpError::Expired | DrpError::Revoked | DrpError::UserMismatch => StatusCode::FORBIDDEN,
            DrpError::UnknownKey | DrpError::Replay | DrpError::Stale | DrpError::MacMismatch => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({"error": self.0.to_string()}));
        (status, body).into_response()
    }
}
