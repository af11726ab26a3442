use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{
    assessment::{Assessment, Dimension, Field},
    assignment::{Assignment, AssignmentField},
    profile::Profile,
    token::AccessToken,
};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn upsert_profile(&self, profile: &Profile) -> Result<()>;
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>>;
    async fn list_profiles(&self) -> Result<Vec<Profile>>;
    /// Record the external IdP account id after provisioning.
    async fn set_identity_id(&self, id: &str, identity_id: &str) -> Result<()>;
}

#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    async fn upsert_assessment(&self, assessment: &Assessment) -> Result<()>;
    async fn get_assessment(&self, id: &str) -> Result<Option<Assessment>>;
    async fn list_assessments(&self) -> Result<Vec<Assessment>>;
    async fn upsert_dimension(&self, dimension: &Dimension) -> Result<()>;
    async fn list_dimensions(&self, assessment_id: &str) -> Result<Vec<Dimension>>;
}

#[async_trait]
pub trait FieldRepository: Send + Sync {
    async fn upsert_field(&self, field: &Field) -> Result<()>;
    /// All fields of an assessment in authored display order.
    async fn list_fields(&self, assessment_id: &str) -> Result<Vec<Field>>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn create_assignment(&self, assignment: &Assignment) -> Result<()>;
    async fn get_assignment(&self, id: &str) -> Result<Option<Assignment>>;
    async fn list_assignments(&self) -> Result<Vec<Assignment>>;
    async fn list_assignments_for_survey(&self, survey_id: &str) -> Result<Vec<Assignment>>;
    async fn set_assignment_url(&self, id: &str, url: &str) -> Result<()>;
    async fn delete_assignment(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait AssignmentFieldRepository: Send + Sync {
    async fn insert_assignment_fields(&self, rows: &[AssignmentField]) -> Result<()>;
    /// Selection rows for an assignment, ordered by position.
    async fn list_assignment_fields(&self, assignment_id: &str) -> Result<Vec<AssignmentField>>;
}

#[async_trait]
pub trait AccessTokenRepository: Send + Sync {
    async fn create_access_token(&self, token: &AccessToken) -> Result<()>;
    async fn get_access_token(&self, token: &str) -> Result<Option<AccessToken>>;
    async fn delete_expired_access_tokens(&self) -> Result<u64>;
}

/// Aggregate row counts shown by the `status` command.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DirectoryCounts {
    pub profiles: i64,
    pub assessments: i64,
    pub assignments: i64,
    pub surveys: i64,
}

#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn get_directory_counts(&self) -> Result<DirectoryCounts>;
}

/// Combined repository trait for all entity types.
pub trait AssayRepository:
    ProfileRepository
    + AssessmentRepository
    + FieldRepository
    + AssignmentRepository
    + AssignmentFieldRepository
    + AccessTokenRepository
    + StatsRepository
{
}
