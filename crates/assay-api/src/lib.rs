//! HTTP API for the Assay directory and batch-assignment workflow.

pub mod api;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use assay_core::config::AssayConfig;
use assay_core::db::repository::AssayRepository;
use assay_core::db::sqlite::SqliteRepository;

/// Shared state for all API handlers. The repository sits behind the
/// combined trait so tests can mount their own implementations.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn AssayRepository>,
    pub config: Arc<AssayConfig>,
}

impl AppState {
    pub fn new(repo: SqliteRepository, config: AssayConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
        }
    }
}

/// Build the full API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/profiles", get(api::directory::list_profiles))
        .route("/api/v1/profiles/:id", get(api::directory::get_profile))
        .route("/api/v1/assessments", get(api::directory::list_assessments))
        .route(
            "/api/v1/assessments/:id",
            get(api::directory::get_assessment),
        )
        .route(
            "/api/v1/assessments/:id/fields",
            get(api::directory::list_assessment_fields),
        )
        .route("/api/v1/assignments", get(api::directory::list_assignments))
        .route(
            "/api/v1/assignments/:id",
            get(api::directory::get_assignment),
        )
        .route(
            "/api/v1/assignments/:id/fields",
            get(api::directory::list_assignment_selection),
        )
        .route(
            "/api/v1/surveys/:id/assignments",
            get(api::directory::list_survey_assignments),
        )
        .route(
            "/api/v1/assignments/batch",
            post(api::assignments::create_batch),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "instance": state.config.assay.instance_name,
    }))
}
