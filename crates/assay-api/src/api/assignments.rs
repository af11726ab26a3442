//! Batch assignment-creation endpoint.

use std::collections::HashMap;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use assay_assign::engine::AssignEngine;
use assay_assign::request::BatchAssignRequest;
use assay_core::error::AssayError;
use assay_core::models::assignment::Assignment;

use super::{require_admin, ApiError};
use crate::AppState;

#[derive(Debug, Serialize)]
struct BatchResponse {
    success: bool,
    survey_id: String,
    assignments: Vec<Assignment>,
    count: usize,
    #[serde(rename = "userPasswords")]
    user_passwords: HashMap<String, String>,
}

/// Create assignments for every (user, assessment) pair in the request.
/// Partial failure still returns 201 with whatever was created; only a
/// batch where nothing was created is an error.
pub async fn create_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BatchAssignRequest>,
) -> Result<Response, ApiError> {
    if let Err(denied) = require_admin(&state, &headers) {
        return Ok(denied);
    }

    let batch = request.validate()?;
    let engine = AssignEngine::new(state.repo.clone(), (*state.config).clone());
    let outcome = engine.run_batch(&batch).await?;

    if outcome.exhausted() {
        return Err(AssayError::Assign(format!(
            "no assignments created: {} pair(s) failed",
            outcome.failures.len()
        ))
        .into());
    }

    let count = outcome.assignments.len();
    Ok((
        StatusCode::CREATED,
        Json(BatchResponse {
            success: true,
            survey_id: outcome.survey_id,
            assignments: outcome.assignments,
            count,
            user_passwords: outcome.user_passwords,
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    use assay_core::config::AssayConfig;
    use assay_core::db::repository::*;
    use assay_core::db::sqlite::SqliteRepository;
    use assay_core::db::DatabasePool;
    use assay_core::error::AssayError;
    use assay_core::models::assessment::{Assessment, Dimension, Field, FieldKind};
    use assay_core::models::assignment::{Assignment, AssignmentField};
    use assay_core::models::profile::Profile;
    use assay_core::models::token::AccessToken;

    use crate::{router, AppState};

    async fn seeded_repo() -> SqliteRepository {
        let pool = DatabasePool::new_sqlite_memory().await.unwrap();
        let repo = match pool {
            DatabasePool::Sqlite(p) => SqliteRepository::new(p),
        };

        for id in ["u1", "u2"] {
            repo.upsert_profile(&Profile {
                id: id.into(),
                email: format!("{id}@example.com"),
                given_name: "Test".into(),
                family_name: id.into(),
                username: None,
                identity_id: Some("idp-x".into()),
                created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            })
            .await
            .unwrap();
        }
        repo.upsert_assessment(&Assessment {
            id: "a1".into(),
            title: "Numerical Reasoning".into(),
            is_360: false,
            number_of_questions: Some(2),
            dimension_question_counts: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        })
        .await
        .unwrap();
        for i in 0..4 {
            repo.upsert_field(&Field {
                id: format!("f{i}"),
                assessment_id: "a1".into(),
                dimension_id: None,
                kind: FieldKind::Question,
                prompt: format!("Question {i}"),
                display_order: i,
            })
            .await
            .unwrap();
        }
        repo
    }

    fn test_config() -> AssayConfig {
        let mut config = AssayConfig::generate_default();
        config.assay.public_url = Some("https://assess.example.com".into());
        config
    }

    async fn post_batch(
        state: AppState,
        body: serde_json::Value,
        bearer: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::post("/api/v1/assignments/batch")
            .header("content-type", "application/json");
        if let Some(token) = bearer {
            request = request.header("authorization", format!("Bearer {token}"));
        }
        let response = router(state)
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn valid_body() -> serde_json::Value {
        serde_json::json!({
            "user_ids": ["u1", "u2"],
            "assessment_ids": ["a1"],
            "expires": "2026-12-31T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn batch_creates_assignments() {
        let state = AppState::new(seeded_repo().await, test_config());
        let (status, body) = post_batch(state.clone(), valid_body(), None).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 2);
        assert_eq!(body["assignments"].as_array().unwrap().len(), 2);
        assert!(body["userPasswords"].as_object().unwrap().is_empty());
        let url = body["assignments"][0]["url"].as_str().unwrap();
        assert!(url.starts_with("https://assess.example.com/a/"));

        // both rows share the returned survey id and are persisted
        let survey_id = body["survey_id"].as_str().unwrap();
        for assignment in body["assignments"].as_array().unwrap() {
            assert_eq!(assignment["survey_id"], survey_id);
        }
        let selection = state
            .repo
            .list_assignment_fields(body["assignments"][0]["id"].as_str().unwrap())
            .await
            .unwrap();
        assert_eq!(selection.len(), 2);
    }

    #[tokio::test]
    async fn invalid_body_is_400() {
        let state = AppState::new(seeded_repo().await, test_config());
        let body = serde_json::json!({"user_ids": [], "assessment_ids": ["a1"], "expires": "2026-12-31"});
        let (status, body) = post_batch(state, body, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("user_ids"));
    }

    #[tokio::test]
    async fn unknown_assessment_is_404() {
        let state = AppState::new(seeded_repo().await, test_config());
        let body = serde_json::json!({
            "user_ids": ["u1"],
            "assessment_ids": ["ghost"],
            "expires": "2026-12-31"
        });
        let (status, _) = post_batch(state, body, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_token_enforced_when_configured() {
        let mut config = test_config();
        config.assay.admin_token = Some("s3cret".into());
        let state = AppState::new(seeded_repo().await, config);

        let (status, _) = post_batch(state.clone(), valid_body(), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = post_batch(state.clone(), valid_body(), Some("wrong")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = post_batch(state, valid_body(), Some("s3cret")).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    /// Delegates to a real repository but fails assignment inserts for one
    /// chosen user.
    struct FlakyRepo {
        inner: SqliteRepository,
        fail_user: String,
    }

    #[async_trait]
    impl ProfileRepository for FlakyRepo {
        async fn upsert_profile(&self, profile: &Profile) -> assay_core::error::Result<()> {
            self.inner.upsert_profile(profile).await
        }
        async fn get_profile(&self, id: &str) -> assay_core::error::Result<Option<Profile>> {
            self.inner.get_profile(id).await
        }
        async fn list_profiles(&self) -> assay_core::error::Result<Vec<Profile>> {
            self.inner.list_profiles().await
        }
        async fn set_identity_id(&self, id: &str, identity_id: &str) -> assay_core::error::Result<()> {
            self.inner.set_identity_id(id, identity_id).await
        }
    }

    #[async_trait]
    impl AssessmentRepository for FlakyRepo {
        async fn upsert_assessment(&self, assessment: &Assessment) -> assay_core::error::Result<()> {
            self.inner.upsert_assessment(assessment).await
        }
        async fn get_assessment(&self, id: &str) -> assay_core::error::Result<Option<Assessment>> {
            self.inner.get_assessment(id).await
        }
        async fn list_assessments(&self) -> assay_core::error::Result<Vec<Assessment>> {
            self.inner.list_assessments().await
        }
        async fn upsert_dimension(&self, dimension: &Dimension) -> assay_core::error::Result<()> {
            self.inner.upsert_dimension(dimension).await
        }
        async fn list_dimensions(&self, assessment_id: &str) -> assay_core::error::Result<Vec<Dimension>> {
            self.inner.list_dimensions(assessment_id).await
        }
    }

    #[async_trait]
    impl FieldRepository for FlakyRepo {
        async fn upsert_field(&self, field: &Field) -> assay_core::error::Result<()> {
            self.inner.upsert_field(field).await
        }
        async fn list_fields(&self, assessment_id: &str) -> assay_core::error::Result<Vec<Field>> {
            self.inner.list_fields(assessment_id).await
        }
    }

    #[async_trait]
    impl AssignmentRepository for FlakyRepo {
        async fn create_assignment(&self, assignment: &Assignment) -> assay_core::error::Result<()> {
            if assignment.user_id == self.fail_user {
                return Err(AssayError::Assign("simulated insert failure".into()));
            }
            self.inner.create_assignment(assignment).await
        }
        async fn get_assignment(&self, id: &str) -> assay_core::error::Result<Option<Assignment>> {
            self.inner.get_assignment(id).await
        }
        async fn list_assignments(&self) -> assay_core::error::Result<Vec<Assignment>> {
            self.inner.list_assignments().await
        }
        async fn list_assignments_for_survey(&self, survey_id: &str) -> assay_core::error::Result<Vec<Assignment>> {
            self.inner.list_assignments_for_survey(survey_id).await
        }
        async fn set_assignment_url(&self, id: &str, url: &str) -> assay_core::error::Result<()> {
            self.inner.set_assignment_url(id, url).await
        }
        async fn delete_assignment(&self, id: &str) -> assay_core::error::Result<bool> {
            self.inner.delete_assignment(id).await
        }
    }

    #[async_trait]
    impl AssignmentFieldRepository for FlakyRepo {
        async fn insert_assignment_fields(&self, rows: &[AssignmentField]) -> assay_core::error::Result<()> {
            self.inner.insert_assignment_fields(rows).await
        }
        async fn list_assignment_fields(&self, assignment_id: &str) -> assay_core::error::Result<Vec<AssignmentField>> {
            self.inner.list_assignment_fields(assignment_id).await
        }
    }

    #[async_trait]
    impl AccessTokenRepository for FlakyRepo {
        async fn create_access_token(&self, token: &AccessToken) -> assay_core::error::Result<()> {
            self.inner.create_access_token(token).await
        }
        async fn get_access_token(&self, token: &str) -> assay_core::error::Result<Option<AccessToken>> {
            self.inner.get_access_token(token).await
        }
        async fn delete_expired_access_tokens(&self) -> assay_core::error::Result<u64> {
            self.inner.delete_expired_access_tokens().await
        }
    }

    #[async_trait]
    impl StatsRepository for FlakyRepo {
        async fn get_directory_counts(&self) -> assay_core::error::Result<DirectoryCounts> {
            self.inner.get_directory_counts().await
        }
    }

    impl AssayRepository for FlakyRepo {}

    fn flaky_state(inner: SqliteRepository, fail_user: &str) -> AppState {
        AppState {
            repo: Arc::new(FlakyRepo {
                inner,
                fail_user: fail_user.to_string(),
            }),
            config: Arc::new(test_config()),
        }
    }

    #[tokio::test]
    async fn partial_failure_still_returns_created() {
        let state = flaky_state(seeded_repo().await, "u2");
        let (status, body) = post_batch(state, valid_body(), None).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 1);
        let assignments = body["assignments"].as_array().unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0]["user_id"], "u1");
    }

    #[tokio::test]
    async fn every_pair_failing_is_500() {
        let state = flaky_state(seeded_repo().await, "u1");
        let body = serde_json::json!({
            "user_ids": ["u1"],
            "assessment_ids": ["a1"],
            "expires": "2026-12-31T00:00:00Z"
        });
        let (status, body) = post_batch(state, body, None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("no assignments created"));
    }

    #[tokio::test]
    async fn reads_stay_open_with_admin_token() {
        let mut config = test_config();
        config.assay.admin_token = Some("s3cret".into());
        let state = AppState::new(seeded_repo().await, config);
        let response = router(state)
            .oneshot(
                Request::get("/api/v1/profiles")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
