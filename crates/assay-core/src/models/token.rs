//! Access token model backing passwordless assignment links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-bound bearer token granting access to a single assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessToken {
    pub token: String,
    pub assignment_id: String,
    pub user_id: String,
    /// Preferred sign-in identifier: username, falling back to email.
    pub login_hint: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
