//! Batch assignment engine.
//!
//! Fans one validated request out over every (user, assessment) pair:
//! provisions missing identities, materializes assignment rows under a
//! shared survey id, draws each user's question subset, and issues
//! passwordless access links. Pairs fail independently; one bad pair never
//! aborts the rest of the batch.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use assay_core::config::AssayConfig;
use assay_core::db::repository::AssayRepository;
use assay_core::error::{AssayError, Result};
use assay_core::models::assessment::{Assessment, Field, QuestionSelectionPolicy};
use assay_core::models::assignment::{Assignment, AssignmentField};
use assay_core::models::profile::Profile;
use assay_core::models::token::AccessToken;
use assay_core::passwords::generate_temp_password;

use crate::identity::{CreateIdentityRequest, IdentityClient, IdentityMetadata};
use crate::request::ValidatedBatch;
use crate::selection::select_question_fields;

/// One (user, assessment) pair whose assignment row could not be created.
#[derive(Debug, Clone)]
pub struct PairFailure {
    pub user_id: String,
    pub assessment_id: String,
    pub error: String,
}

/// Result of one batch run: everything that was created, plus what wasn't.
#[derive(Debug)]
pub struct BatchOutcome {
    pub survey_id: String,
    pub assignments: Vec<Assignment>,
    /// Temporary passwords for identities provisioned during this batch,
    /// keyed by user id. Users who already had an identity do not appear.
    pub user_passwords: HashMap<String, String>,
    pub failures: Vec<PairFailure>,
}

impl BatchOutcome {
    /// True when every pair in the batch failed.
    pub fn exhausted(&self) -> bool {
        self.assignments.is_empty() && !self.failures.is_empty()
    }
}

pub struct AssignEngine<R: AssayRepository + ?Sized> {
    repo: Arc<R>,
    identity: Option<IdentityClient>,
    config: AssayConfig,
}

impl<R: AssayRepository + ?Sized> AssignEngine<R> {
    pub fn new(repo: Arc<R>, config: AssayConfig) -> Self {
        let identity = config
            .identity
            .enabled
            .then(|| IdentityClient::from_config(&config.identity));
        Self {
            repo,
            identity,
            config,
        }
    }

    /// Run one batch. Returns an error only when the request references
    /// entities that do not exist; per-pair persistence failures are
    /// collected in the outcome instead.
    pub async fn run_batch(&self, batch: &ValidatedBatch) -> Result<BatchOutcome> {
        let now = Utc::now();

        let profiles = self.load_profiles(&batch.user_ids).await?;
        let assessments = self.load_assessments(&batch.assessment_ids).await?;
        if let Some(target_id) = &batch.target_id {
            if self.repo.get_profile(target_id).await?.is_none() {
                return Err(AssayError::NotFound(format!("target profile {target_id}")));
            }
        }

        let user_passwords = self.provision_identities(&profiles).await;

        let survey_id = batch
            .survey_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        info!(
            survey_id = %survey_id,
            users = profiles.len(),
            assessments = assessments.len(),
            "running assignment batch"
        );

        let mut assignments = Vec::new();
        let mut failures = Vec::new();
        for profile in &profiles {
            for (assessment, fields, policy) in &assessments {
                match self
                    .materialize_pair(batch, profile, assessment, fields, policy, &survey_id, now)
                    .await
                {
                    Ok(assignment) => assignments.push(assignment),
                    Err(e) => {
                        warn!(
                            user_id = %profile.id,
                            assessment_id = %assessment.id,
                            error = %e,
                            "assignment creation failed, continuing batch"
                        );
                        failures.push(PairFailure {
                            user_id: profile.id.clone(),
                            assessment_id: assessment.id.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            survey_id = %survey_id,
            created = assignments.len(),
            failed = failures.len(),
            "assignment batch finished"
        );

        Ok(BatchOutcome {
            survey_id,
            assignments,
            user_passwords,
            failures,
        })
    }

    async fn load_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>> {
        let mut profiles = Vec::with_capacity(user_ids.len());
        for id in user_ids {
            let profile = self
                .repo
                .get_profile(id)
                .await?
                .ok_or_else(|| AssayError::NotFound(format!("profile {id}")))?;
            profiles.push(profile);
        }
        Ok(profiles)
    }

    /// Load each assessment with its field list and resolved selection
    /// policy, once per batch rather than once per pair.
    async fn load_assessments(
        &self,
        assessment_ids: &[String],
    ) -> Result<Vec<(Assessment, Vec<Field>, QuestionSelectionPolicy)>> {
        let mut assessments = Vec::with_capacity(assessment_ids.len());
        for id in assessment_ids {
            let assessment = self
                .repo
                .get_assessment(id)
                .await?
                .ok_or_else(|| AssayError::NotFound(format!("assessment {id}")))?;
            let fields = self.repo.list_fields(id).await?;
            let policy = QuestionSelectionPolicy::from_assessment(&assessment);
            assessments.push((assessment, fields, policy));
        }
        Ok(assessments)
    }

    /// Create IdP accounts for users that have none yet. Best effort: a
    /// provisioning failure leaves the user without an identity but still
    /// in the batch.
    async fn provision_identities(&self, profiles: &[Profile]) -> HashMap<String, String> {
        let mut passwords = HashMap::new();
        let Some(client) = &self.identity else {
            return passwords;
        };

        for profile in profiles {
            if profile.identity_id.is_some() {
                continue;
            }
            let password = generate_temp_password(self.config.identity.password_length);
            let display_name = profile.display_name();
            let request = CreateIdentityRequest {
                email: &profile.email,
                password: &password,
                email_confirm: true,
                user_metadata: IdentityMetadata {
                    display_name: &display_name,
                    username: profile.username.as_deref(),
                },
            };
            match client.create_user(&request).await {
                Ok(created) => {
                    if let Err(e) = self.repo.set_identity_id(&profile.id, &created.id).await {
                        warn!(user_id = %profile.id, error = %e, "failed to record identity id");
                    }
                    info!(user_id = %profile.id, identity_id = %created.id, "provisioned identity");
                    passwords.insert(profile.id.clone(), password);
                }
                Err(e) => {
                    warn!(user_id = %profile.id, error = %e, "identity provisioning failed, continuing");
                }
            }
        }
        passwords
    }

    #[allow(clippy::too_many_arguments)]
    async fn materialize_pair(
        &self,
        batch: &ValidatedBatch,
        profile: &Profile,
        assessment: &Assessment,
        fields: &[Field],
        policy: &QuestionSelectionPolicy,
        survey_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Assignment> {
        let next_reminder = if batch.reminder {
            batch
                .first_reminder_date
                .or_else(|| batch.reminder_frequency.map(|f| f.next_from(now)))
        } else {
            None
        };

        let mut assignment = Assignment {
            id: Uuid::new_v4().to_string(),
            user_id: profile.id.clone(),
            assessment_id: assessment.id.clone(),
            target_id: batch.target_id.clone(),
            survey_id: survey_id.to_string(),
            expires: batch.expires,
            whitelabel: batch.whitelabel,
            completed: false,
            custom_fields: batch.custom_fields.clone(),
            job_id: batch.job_id.clone(),
            reminder: batch.reminder,
            reminder_frequency: batch.reminder_frequency,
            next_reminder,
            url: None,
            created_at: now,
        };
        self.repo.create_assignment(&assignment).await?;

        // 360 assessments show everyone the full instrument, so no
        // per-assignment subset is stored.
        if !assessment.is_360 {
            if let Err(e) = self.store_selection(&assignment.id, fields, policy).await {
                warn!(
                    assignment_id = %assignment.id,
                    error = %e,
                    "question selection failed, assignment kept without subset"
                );
            }
        }

        match self.issue_url(&assignment, profile, now).await {
            Ok(Some(url)) => assignment.url = Some(url),
            Ok(None) => {}
            Err(e) => {
                warn!(
                    assignment_id = %assignment.id,
                    error = %e,
                    "access link issuing failed, assignment kept without url"
                );
            }
        }

        Ok(assignment)
    }

    async fn store_selection(
        &self,
        assignment_id: &str,
        fields: &[Field],
        policy: &QuestionSelectionPolicy,
    ) -> Result<()> {
        let selected = select_question_fields(fields, policy, &mut rand::thread_rng());
        if selected.is_empty() {
            return Ok(());
        }
        let rows: Vec<AssignmentField> = selected
            .iter()
            .enumerate()
            .map(|(i, field)| AssignmentField {
                assignment_id: assignment_id.to_string(),
                field_id: field.id.clone(),
                position: i as i64 + 1,
            })
            .collect();
        self.repo.insert_assignment_fields(&rows).await
    }

    /// Mint an access token and patch the resulting link onto the
    /// assignment row. Requires a configured public URL.
    async fn issue_url(
        &self,
        assignment: &Assignment,
        profile: &Profile,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let Some(public_url) = &self.config.assay.public_url else {
            return Ok(None);
        };

        let token = AccessToken {
            token: Uuid::new_v4().simple().to_string(),
            assignment_id: assignment.id.clone(),
            user_id: profile.id.clone(),
            login_hint: profile.login_hint().to_string(),
            expires_at: assignment.expires,
            created_at: now,
        };
        self.repo.create_access_token(&token).await?;

        let url = format!("{}/a/{}", public_url.trim_end_matches('/'), token.token);
        self.repo.set_assignment_url(&assignment.id, &url).await?;
        Ok(Some(url))
    }
}
