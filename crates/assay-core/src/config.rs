//! TOML-based configuration system for Assay.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};

/// Top-level Assay configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssayConfig {
    pub assay: AssaySection,
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Core Assay instance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssaySection {
    pub instance_name: String,
    pub data_dir: String,
    /// Public base URL used when building assignment access links.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Bearer token required on write endpoints. When unset, writes are open.
    #[serde(default)]
    pub admin_token: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseDriver::default_driver")]
    pub driver: DatabaseDriver,
    /// SQLite file path (used when driver = "sqlite").
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::Sqlite,
            path: Some("/var/lib/assay/assay.db".into()),
        }
    }
}

/// Supported database drivers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseDriver {
    Sqlite,
}

impl DatabaseDriver {
    fn default_driver() -> Self {
        Self::Sqlite
    }
}

/// External identity-provider admin API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the IdP admin API.
    #[serde(default)]
    pub base_url: String,
    /// Admin bearer token for the IdP API.
    #[serde(default)]
    pub admin_token: String,
    /// Length of generated temporary passwords.
    #[serde(default = "default_password_length")]
    pub password_length: usize,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            admin_token: String::new(),
            password_length: default_password_length(),
        }
    }
}

fn default_password_length() -> usize {
    12
}

impl AssayConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| AssayError::Config(format!("invalid config: {e}")))
    }

    /// Write configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| AssayError::Serialization(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.assay.instance_name.is_empty() {
            return Err(AssayError::Config("instance_name must not be empty".into()));
        }
        if self.assay.database.driver == DatabaseDriver::Sqlite
            && self.assay.database.path.is_none()
        {
            return Err(AssayError::Config("sqlite database path not set".into()));
        }
        if self.identity.enabled && self.identity.base_url.is_empty() {
            return Err(AssayError::Config(
                "identity.base_url required when identity provisioning is enabled".into(),
            ));
        }
        if self.identity.password_length < 8 {
            return Err(AssayError::Config(
                "identity.password_length must be at least 8".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default configuration suitable for a fresh install.
    pub fn generate_default() -> Self {
        Self {
            assay: AssaySection {
                instance_name: "assay".into(),
                data_dir: "/var/lib/assay".into(),
                public_url: None,
                admin_token: None,
                database: DatabaseConfig::default(),
            },
            identity: IdentityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = AssayConfig::generate_default();
        config.validate().unwrap();
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assay.toml");

        let mut config = AssayConfig::generate_default();
        config.assay.instance_name = "acme-hr".into();
        config.identity.enabled = true;
        config.identity.base_url = "https://idp.example.com".into();
        config.save(&path).unwrap();

        let loaded = AssayConfig::load(&path).unwrap();
        assert_eq!(loaded.assay.instance_name, "acme-hr");
        assert!(loaded.identity.enabled);
        assert_eq!(loaded.identity.password_length, 12);
    }

    #[test]
    fn load_missing_file_fails() {
        let result = AssayConfig::load(Path::new("/nonexistent/assay.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn empty_instance_name_rejected() {
        let mut config = AssayConfig::generate_default();
        config.assay.instance_name = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("instance_name"));
    }

    #[test]
    fn identity_enabled_requires_base_url() {
        let mut config = AssayConfig::generate_default();
        config.identity.enabled = true;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn short_password_length_rejected() {
        let mut config = AssayConfig::generate_default();
        config.identity.password_length = 4;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("password_length"));
    }

    #[test]
    fn minimal_toml_parses_with_defaults() {
        let toml = r#"
            [assay]
            instance_name = "assay"
            data_dir = "/tmp/assay"
        "#;
        let config: AssayConfig = toml::from_str(toml).unwrap();
        assert!(!config.identity.enabled);
        assert_eq!(config.assay.database.driver, DatabaseDriver::Sqlite);
    }
}
