use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A person in the directory who can be assigned assessments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// External identity-provider account id; absent until provisioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Identifier to embed in access links: username, falling back to email.
    pub fn login_hint(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.email)
    }

    /// Display name used when provisioning the external identity.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_profile() -> Profile {
        Profile {
            id: "user-001".to_string(),
            email: "jdoe@example.com".to_string(),
            given_name: "John".to_string(),
            family_name: "Doe".to_string(),
            username: Some("jdoe".to_string()),
            identity_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn profile_round_trip() {
        let profile = sample_profile();
        let json = serde_json::to_string(&profile).unwrap();
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn optional_fields_omitted() {
        let mut profile = sample_profile();
        profile.username = None;
        profile.identity_id = None;
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("\"username\""));
        assert!(!json.contains("\"identity_id\""));
    }

    #[test]
    fn login_hint_prefers_username() {
        let profile = sample_profile();
        assert_eq!(profile.login_hint(), "jdoe");
    }

    #[test]
    fn login_hint_falls_back_to_email() {
        let mut profile = sample_profile();
        profile.username = None;
        assert_eq!(profile.login_hint(), "jdoe@example.com");
    }

    #[test]
    fn display_name_joins_names() {
        assert_eq!(sample_profile().display_name(), "John Doe");
    }
}
