//! Admin client for the external identity provider.

use serde::{Deserialize, Serialize};

use assay_core::config::IdentityConfig;
use assay_core::error::{AssayError, Result};

/// Thin client for the IdP admin API. One instance per request-handling
/// invocation; holds no state beyond the connection pool.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    admin_token: String,
}

/// Body of an admin create-user call. The account is created pre-confirmed;
/// no verification email is sent.
#[derive(Debug, Serialize)]
pub struct CreateIdentityRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub email_confirm: bool,
    pub user_metadata: IdentityMetadata<'a>,
}

/// Profile metadata attached to the identity at creation time.
#[derive(Debug, Serialize)]
pub struct IdentityMetadata<'a> {
    pub display_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedIdentity {
    pub id: String,
}

impl IdentityClient {
    pub fn new(base_url: impl Into<String>, admin_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            admin_token: admin_token.into(),
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.base_url.clone(), config.admin_token.clone())
    }

    /// Create an authentication identity bound to the given email.
    pub async fn create_user(
        &self,
        request: &CreateIdentityRequest<'_>,
    ) -> Result<CreatedIdentity> {
        let url = format!("{}/admin/v1/users", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.admin_token)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AssayError::Identity(format!(
                "create user returned {status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }
}
