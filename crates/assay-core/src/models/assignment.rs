use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Reminder cadence offsets accepted on batch-assignment requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReminderFrequency {
    #[serde(rename = "+1 day")]
    OneDay,
    #[serde(rename = "+2 days")]
    TwoDays,
    #[serde(rename = "+3 days")]
    ThreeDays,
    #[serde(rename = "+4 days")]
    FourDays,
    #[serde(rename = "+5 days")]
    FiveDays,
    #[serde(rename = "+6 days")]
    SixDays,
    #[serde(rename = "+1 week")]
    OneWeek,
    #[serde(rename = "+2 weeks")]
    TwoWeeks,
    #[serde(rename = "+3 weeks")]
    ThreeWeeks,
    #[serde(rename = "+1 month")]
    OneMonth,
    #[serde(rename = "+2 months")]
    TwoMonths,
    #[serde(rename = "+3 months")]
    ThreeMonths,
}

impl ReminderFrequency {
    /// Parse an interval string. Unrecognized values yield `None`; callers
    /// treat that as "no reminder" rather than an error.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "+1 day" => Some(Self::OneDay),
            "+2 days" => Some(Self::TwoDays),
            "+3 days" => Some(Self::ThreeDays),
            "+4 days" => Some(Self::FourDays),
            "+5 days" => Some(Self::FiveDays),
            "+6 days" => Some(Self::SixDays),
            "+1 week" => Some(Self::OneWeek),
            "+2 weeks" => Some(Self::TwoWeeks),
            "+3 weeks" => Some(Self::ThreeWeeks),
            "+1 month" => Some(Self::OneMonth),
            "+2 months" => Some(Self::TwoMonths),
            "+3 months" => Some(Self::ThreeMonths),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "+1 day",
            Self::TwoDays => "+2 days",
            Self::ThreeDays => "+3 days",
            Self::FourDays => "+4 days",
            Self::FiveDays => "+5 days",
            Self::SixDays => "+6 days",
            Self::OneWeek => "+1 week",
            Self::TwoWeeks => "+2 weeks",
            Self::ThreeWeeks => "+3 weeks",
            Self::OneMonth => "+1 month",
            Self::TwoMonths => "+2 months",
            Self::ThreeMonths => "+3 months",
        }
    }

    /// The next reminder instant, offset from `now`.
    pub fn next_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::OneDay => now + Duration::days(1),
            Self::TwoDays => now + Duration::days(2),
            Self::ThreeDays => now + Duration::days(3),
            Self::FourDays => now + Duration::days(4),
            Self::FiveDays => now + Duration::days(5),
            Self::SixDays => now + Duration::days(6),
            Self::OneWeek => now + Duration::weeks(1),
            Self::TwoWeeks => now + Duration::weeks(2),
            Self::ThreeWeeks => now + Duration::weeks(3),
            Self::OneMonth => now.checked_add_months(Months::new(1)).unwrap_or(now),
            Self::TwoMonths => now.checked_add_months(Months::new(2)).unwrap_or(now),
            Self::ThreeMonths => now.checked_add_months(Months::new(3)).unwrap_or(now),
        }
    }
}

/// One (user, assessment) pairing granting a user access to complete one
/// assessment instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: String,
    pub user_id: String,
    pub assessment_id: String,
    /// For rater assignments: the person being assessed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    /// Grouping token shared by every assignment created in one batch.
    pub survey_id: String,
    pub expires: DateTime<Utc>,
    pub whitelabel: bool,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub reminder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_frequency: Option<ReminderFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_reminder: Option<DateTime<Utc>>,
    /// Signed passwordless access link, patched on after creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One question shown to one user at one position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentField {
    pub assignment_id: String,
    pub field_id: String,
    /// 1-based position in the user's question sequence.
    pub position: i64,
}
