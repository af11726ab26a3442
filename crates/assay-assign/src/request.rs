//! Batch-assignment request validation.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use tracing::warn;

use assay_core::error::{AssayError, Result};
use assay_core::models::assignment::ReminderFrequency;

/// Raw JSON body of a batch-assignment request, as posted by callers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchAssignRequest {
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub assessment_ids: Vec<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub whitelabel: Option<bool>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub survey_id: Option<String>,
    #[serde(default)]
    pub reminder: Option<bool>,
    #[serde(default)]
    pub first_reminder_date: Option<String>,
    #[serde(default)]
    pub reminder_frequency: Option<String>,
}

/// A batch request after validation: parsed instants, defaulted booleans,
/// lenient reminder frequency. Immutable input to the engine.
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    pub user_ids: Vec<String>,
    pub assessment_ids: Vec<String>,
    pub expires: DateTime<Utc>,
    pub target_id: Option<String>,
    pub custom_fields: Option<BTreeMap<String, Vec<String>>>,
    pub whitelabel: bool,
    pub job_id: Option<String>,
    pub survey_id: Option<String>,
    pub reminder: bool,
    pub first_reminder_date: Option<DateTime<Utc>>,
    pub reminder_frequency: Option<ReminderFrequency>,
}

impl BatchAssignRequest {
    /// Validate and normalize the request. No side effects.
    pub fn validate(self) -> Result<ValidatedBatch> {
        if self.user_ids.is_empty() {
            return Err(AssayError::Validation(
                "user_ids must be a non-empty list".into(),
            ));
        }
        if self.assessment_ids.is_empty() {
            return Err(AssayError::Validation(
                "assessment_ids must be a non-empty list".into(),
            ));
        }

        let expires_raw = self
            .expires
            .ok_or_else(|| AssayError::Validation("expires is required".into()))?;
        let expires = parse_instant(&expires_raw).ok_or_else(|| {
            AssayError::Validation(format!("expires is not a valid date: '{expires_raw}'"))
        })?;

        let first_reminder_date = match &self.first_reminder_date {
            Some(raw) => Some(parse_instant(raw).ok_or_else(|| {
                AssayError::Validation(format!(
                    "first_reminder_date is not a valid date: '{raw}'"
                ))
            })?),
            None => None,
        };

        // Unrecognized frequencies silently yield no reminder; log so the
        // leniency is at least observable.
        let reminder_frequency = self.reminder_frequency.as_deref().and_then(|raw| {
            let parsed = ReminderFrequency::parse(raw);
            if parsed.is_none() {
                warn!(frequency = %raw, "unrecognized reminder frequency ignored");
            }
            parsed
        });

        Ok(ValidatedBatch {
            user_ids: self.user_ids,
            assessment_ids: self.assessment_ids,
            expires,
            target_id: self.target_id,
            custom_fields: self.custom_fields,
            whitelabel: self.whitelabel.unwrap_or(false),
            job_id: self.job_id,
            survey_id: self.survey_id,
            reminder: self.reminder.unwrap_or(false),
            first_reminder_date,
            reminder_frequency,
        })
    }
}

/// Parse an RFC 3339 instant, or a bare `YYYY-MM-DD` date as midnight UTC.
fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}
