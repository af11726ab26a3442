pub mod assignments;
pub mod directory;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use assay_core::error::AssayError;

use crate::AppState;

/// Maps domain errors onto HTTP status codes with a JSON error body.
pub struct ApiError(pub AssayError);

impl From<AssayError> for ApiError {
    fn from(e: AssayError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AssayError::Validation(_) => StatusCode::BAD_REQUEST,
            AssayError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

/// Require the configured admin bearer token on write endpoints. When no
/// token is configured, writes are open.
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = &state.config.assay.admin_token else {
        return Ok(());
    };
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if presented == Some(expected.as_str()) {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": "invalid or missing admin token"})),
        )
            .into_response())
    }
}
