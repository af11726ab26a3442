//! Read endpoints over the directory: profiles, assessments, fields,
//! assignments. Responses wrap each entity in a named envelope.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use assay_core::db::repository::{
    AssessmentRepository, AssignmentFieldRepository, AssignmentRepository, FieldRepository,
    ProfileRepository,
};

use super::ApiError;
use crate::AppState;

pub async fn list_profiles(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let profiles = state.repo.list_profiles().await?;
    let count = profiles.len();
    Ok(Json(json!({"profiles": profiles, "count": count})))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.repo.get_profile(&id).await? {
        Some(profile) => Ok(Json(json!({"profile": profile})).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("profile {id} not found")})),
        )
            .into_response()),
    }
}

pub async fn list_assessments(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let assessments = state.repo.list_assessments().await?;
    let count = assessments.len();
    Ok(Json(json!({"assessments": assessments, "count": count})))
}

pub async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.repo.get_assessment(&id).await? {
        Some(assessment) => Ok(Json(json!({"assessment": assessment})).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("assessment {id} not found")})),
        )
            .into_response()),
    }
}

pub async fn list_assessment_fields(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.repo.get_assessment(&id).await?.is_none() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("assessment {id} not found")})),
        )
            .into_response());
    }
    let fields = state.repo.list_fields(&id).await?;
    let count = fields.len();
    Ok(Json(json!({"fields": fields, "count": count})).into_response())
}

pub async fn list_assignments(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = state.repo.list_assignments().await?;
    let count = assignments.len();
    Ok(Json(json!({"assignments": assignments, "count": count})))
}

pub async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.repo.get_assignment(&id).await? {
        Some(assignment) => Ok(Json(json!({"assignment": assignment})).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("assignment {id} not found")})),
        )
            .into_response()),
    }
}

/// The question subset selected for one assignment, in position order.
/// Empty for full-instrument (including 360) assignments.
pub async fn list_assignment_selection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.repo.get_assignment(&id).await?.is_none() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("assignment {id} not found")})),
        )
            .into_response());
    }
    let fields = state.repo.list_assignment_fields(&id).await?;
    let count = fields.len();
    Ok(Json(json!({"fields": fields, "count": count})).into_response())
}

pub async fn list_survey_assignments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = state.repo.list_assignments_for_survey(&id).await?;
    let count = assignments.len();
    Ok(Json(json!({
        "survey_id": id,
        "assignments": assignments,
        "count": count,
    })))
}
