use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::models::{
    assessment::{Assessment, Dimension, Field, FieldKind},
    assignment::{Assignment, AssignmentField, ReminderFrequency},
    profile::Profile,
    token::AccessToken,
};

use super::repository::{
    AccessTokenRepository, AssayRepository, AssessmentRepository, AssignmentFieldRepository,
    AssignmentRepository, DirectoryCounts, FieldRepository, ProfileRepository, StatsRepository,
};

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl AssayRepository for SqliteRepository {}

// -- Helper functions for mapping DB strings --

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            tracing::warn!(value = %s, "unparseable stored timestamp, using now");
            Utc::now()
        })
}

fn datetime_to_str(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_field_kind(s: &str) -> FieldKind {
    match s {
        "question" => FieldKind::Question,
        "instructions" => FieldKind::Instructions,
        "page_break" => FieldKind::PageBreak,
        _ => FieldKind::Question,
    }
}

fn field_kind_to_str(k: &FieldKind) -> &'static str {
    match k {
        FieldKind::Question => "question",
        FieldKind::Instructions => "instructions",
        FieldKind::PageBreak => "page_break",
    }
}

fn parse_json_map<T: serde::de::DeserializeOwned>(s: Option<String>) -> Option<T> {
    s.and_then(|s| serde_json::from_str(&s).ok())
}

fn json_map_to_str<T: serde::Serialize>(v: &Option<T>) -> Option<String> {
    v.as_ref().and_then(|m| serde_json::to_string(m).ok())
}

// -- Row mapping --

fn row_to_profile(r: &SqliteRow) -> Profile {
    let created: String = r.get("created_at");
    Profile {
        id: r.get("id"),
        email: r.get("email"),
        given_name: r.get("given_name"),
        family_name: r.get("family_name"),
        username: r.get("username"),
        identity_id: r.get("identity_id"),
        created_at: parse_datetime(&created),
    }
}

fn row_to_assessment(r: &SqliteRow) -> Assessment {
    let created: String = r.get("created_at");
    let counts: Option<String> = r.get("dimension_question_counts");
    Assessment {
        id: r.get("id"),
        title: r.get("title"),
        is_360: r.get("is_360"),
        number_of_questions: r.get("number_of_questions"),
        dimension_question_counts: parse_json_map::<BTreeMap<String, i64>>(counts),
        created_at: parse_datetime(&created),
    }
}

fn row_to_field(r: &SqliteRow) -> Field {
    let kind: String = r.get("kind");
    Field {
        id: r.get("id"),
        assessment_id: r.get("assessment_id"),
        dimension_id: r.get("dimension_id"),
        kind: parse_field_kind(&kind),
        prompt: r.get("prompt"),
        display_order: r.get("display_order"),
    }
}

fn row_to_assignment(r: &SqliteRow) -> Assignment {
    let expires: String = r.get("expires");
    let created: String = r.get("created_at");
    let custom_fields: Option<String> = r.get("custom_fields");
    let frequency: Option<String> = r.get("reminder_frequency");
    let next_reminder: Option<String> = r.get("next_reminder");
    Assignment {
        id: r.get("id"),
        user_id: r.get("user_id"),
        assessment_id: r.get("assessment_id"),
        target_id: r.get("target_id"),
        survey_id: r.get("survey_id"),
        expires: parse_datetime(&expires),
        whitelabel: r.get("whitelabel"),
        completed: r.get("completed"),
        custom_fields: parse_json_map::<BTreeMap<String, Vec<String>>>(custom_fields),
        job_id: r.get("job_id"),
        reminder: r.get("reminder"),
        reminder_frequency: frequency.as_deref().and_then(ReminderFrequency::parse),
        next_reminder: next_reminder.map(|s| parse_datetime(&s)),
        url: r.get("url"),
        created_at: parse_datetime(&created),
    }
}

fn row_to_access_token(r: &SqliteRow) -> AccessToken {
    let expires: String = r.get("expires_at");
    let created: String = r.get("created_at");
    AccessToken {
        token: r.get("token"),
        assignment_id: r.get("assignment_id"),
        user_id: r.get("user_id"),
        login_hint: r.get("login_hint"),
        expires_at: parse_datetime(&expires),
        created_at: parse_datetime(&created),
    }
}

#[async_trait]
impl ProfileRepository for SqliteRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        sqlx::query(
            "INSERT INTO profiles (id, email, given_name, family_name, username, identity_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
               email = excluded.email,
               given_name = excluded.given_name,
               family_name = excluded.family_name,
               username = excluded.username,
               identity_id = excluded.identity_id",
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&profile.given_name)
        .bind(&profile.family_name)
        .bind(&profile.username)
        .bind(&profile.identity_id)
        .bind(datetime_to_str(&profile.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_profile(&r)))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let rows = sqlx::query("SELECT * FROM profiles ORDER BY family_name, given_name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_profile).collect())
    }

    async fn set_identity_id(&self, id: &str, identity_id: &str) -> Result<()> {
        sqlx::query("UPDATE profiles SET identity_id = ?2 WHERE id = ?1")
            .bind(id)
            .bind(identity_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AssessmentRepository for SqliteRepository {
    async fn upsert_assessment(&self, assessment: &Assessment) -> Result<()> {
        sqlx::query(
            "INSERT INTO assessments (id, title, is_360, number_of_questions, dimension_question_counts, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
               title = excluded.title,
               is_360 = excluded.is_360,
               number_of_questions = excluded.number_of_questions,
               dimension_question_counts = excluded.dimension_question_counts",
        )
        .bind(&assessment.id)
        .bind(&assessment.title)
        .bind(assessment.is_360)
        .bind(assessment.number_of_questions)
        .bind(json_map_to_str(&assessment.dimension_question_counts))
        .bind(datetime_to_str(&assessment.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_assessment(&self, id: &str) -> Result<Option<Assessment>> {
        let row = sqlx::query("SELECT * FROM assessments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_assessment(&r)))
    }

    async fn list_assessments(&self) -> Result<Vec<Assessment>> {
        let rows = sqlx::query("SELECT * FROM assessments ORDER BY title")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_assessment).collect())
    }

    async fn upsert_dimension(&self, dimension: &Dimension) -> Result<()> {
        sqlx::query(
            "INSERT INTO dimensions (id, assessment_id, name)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(&dimension.id)
        .bind(&dimension.assessment_id)
        .bind(&dimension.name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_dimensions(&self, assessment_id: &str) -> Result<Vec<Dimension>> {
        let rows = sqlx::query("SELECT * FROM dimensions WHERE assessment_id = ?1 ORDER BY name")
            .bind(assessment_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| Dimension {
                id: r.get("id"),
                assessment_id: r.get("assessment_id"),
                name: r.get("name"),
            })
            .collect())
    }
}

#[async_trait]
impl FieldRepository for SqliteRepository {
    async fn upsert_field(&self, field: &Field) -> Result<()> {
        sqlx::query(
            "INSERT INTO fields (id, assessment_id, dimension_id, kind, prompt, display_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
               dimension_id = excluded.dimension_id,
               kind = excluded.kind,
               prompt = excluded.prompt,
               display_order = excluded.display_order",
        )
        .bind(&field.id)
        .bind(&field.assessment_id)
        .bind(&field.dimension_id)
        .bind(field_kind_to_str(&field.kind))
        .bind(&field.prompt)
        .bind(field.display_order)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_fields(&self, assessment_id: &str) -> Result<Vec<Field>> {
        let rows =
            sqlx::query("SELECT * FROM fields WHERE assessment_id = ?1 ORDER BY display_order")
                .bind(assessment_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().map(row_to_field).collect())
    }
}

#[async_trait]
impl AssignmentRepository for SqliteRepository {
    async fn create_assignment(&self, assignment: &Assignment) -> Result<()> {
        sqlx::query(
            "INSERT INTO assignments (id, user_id, assessment_id, target_id, survey_id, expires,
               whitelabel, completed, custom_fields, job_id, reminder, reminder_frequency,
               next_reminder, url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .bind(&assignment.id)
        .bind(&assignment.user_id)
        .bind(&assignment.assessment_id)
        .bind(&assignment.target_id)
        .bind(&assignment.survey_id)
        .bind(datetime_to_str(&assignment.expires))
        .bind(assignment.whitelabel)
        .bind(assignment.completed)
        .bind(json_map_to_str(&assignment.custom_fields))
        .bind(&assignment.job_id)
        .bind(assignment.reminder)
        .bind(assignment.reminder_frequency.map(|f| f.as_str()))
        .bind(assignment.next_reminder.as_ref().map(datetime_to_str))
        .bind(&assignment.url)
        .bind(datetime_to_str(&assignment.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_assignment(&self, id: &str) -> Result<Option<Assignment>> {
        let row = sqlx::query("SELECT * FROM assignments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_assignment(&r)))
    }

    async fn list_assignments(&self) -> Result<Vec<Assignment>> {
        let rows = sqlx::query("SELECT * FROM assignments ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_assignment).collect())
    }

    async fn list_assignments_for_survey(&self, survey_id: &str) -> Result<Vec<Assignment>> {
        let rows =
            sqlx::query("SELECT * FROM assignments WHERE survey_id = ?1 ORDER BY created_at, id")
                .bind(survey_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().map(row_to_assignment).collect())
    }

    async fn set_assignment_url(&self, id: &str, url: &str) -> Result<()> {
        sqlx::query("UPDATE assignments SET url = ?2 WHERE id = ?1")
            .bind(id)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_assignment(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AssignmentFieldRepository for SqliteRepository {
    async fn insert_assignment_fields(&self, rows: &[AssignmentField]) -> Result<()> {
        for row in rows {
            sqlx::query(
                "INSERT INTO assignment_fields (assignment_id, field_id, position)
                 VALUES (?1, ?2, ?3)",
            )
            .bind(&row.assignment_id)
            .bind(&row.field_id)
            .bind(row.position)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn list_assignment_fields(&self, assignment_id: &str) -> Result<Vec<AssignmentField>> {
        let rows = sqlx::query(
            "SELECT * FROM assignment_fields WHERE assignment_id = ?1 ORDER BY position",
        )
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| AssignmentField {
                assignment_id: r.get("assignment_id"),
                field_id: r.get("field_id"),
                position: r.get("position"),
            })
            .collect())
    }
}

#[async_trait]
impl AccessTokenRepository for SqliteRepository {
    async fn create_access_token(&self, token: &AccessToken) -> Result<()> {
        sqlx::query(
            "INSERT INTO access_tokens (token, assignment_id, user_id, login_hint, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&token.token)
        .bind(&token.assignment_id)
        .bind(&token.user_id)
        .bind(&token.login_hint)
        .bind(datetime_to_str(&token.expires_at))
        .bind(datetime_to_str(&token.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_access_token(&self, token: &str) -> Result<Option<AccessToken>> {
        let row = sqlx::query("SELECT * FROM access_tokens WHERE token = ?1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_access_token(&r)))
    }

    async fn delete_expired_access_tokens(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE expires_at < ?1")
            .bind(datetime_to_str(&Utc::now()))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl StatsRepository for SqliteRepository {
    async fn get_directory_counts(&self) -> Result<DirectoryCounts> {
        let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        let assessments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assessments")
            .fetch_one(&self.pool)
            .await?;
        let assignments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assignments")
            .fetch_one(&self.pool)
            .await?;
        let surveys: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT survey_id) FROM assignments")
            .fetch_one(&self.pool)
            .await?;
        Ok(DirectoryCounts {
            profiles,
            assessments,
            assignments,
            surveys,
        })
    }
}
