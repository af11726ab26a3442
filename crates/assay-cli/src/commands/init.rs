use std::path::Path;

use assay_core::config::{AssayConfig, AssaySection, DatabaseConfig, DatabaseDriver};
use assay_core::db::DatabasePool;
use tracing::info;

/// Run the `init` command: create the data directory, write a default
/// config, and set up the database.
pub async fn run(data_dir: &str) -> anyhow::Result<()> {
    let data_path = Path::new(data_dir);

    if !data_path.exists() {
        std::fs::create_dir_all(data_path)?;
        info!("Created data directory: {}", data_dir);
    }

    let db_path = data_path.join("assay.db");
    let db_path_str = db_path.to_string_lossy().to_string();

    let config = AssayConfig {
        assay: AssaySection {
            instance_name: "My Organization".into(),
            data_dir: data_dir.to_string(),
            public_url: None,
            admin_token: None,
            database: DatabaseConfig {
                driver: DatabaseDriver::Sqlite,
                path: Some(db_path_str.clone()),
            },
        },
        identity: Default::default(),
    };

    let config_path = data_path.join("assay.toml");
    config.save(&config_path)?;
    info!("Wrote configuration to {}", config_path.display());

    // Create database and run migrations
    let connect_str = format!("sqlite:{}?mode=rwc", db_path_str);
    DatabasePool::new_sqlite(&connect_str).await?;
    info!("Database initialized at {}", db_path_str);

    println!("Assay initialized successfully!");
    println!("  Data directory: {}", data_dir);
    println!("  Configuration: {}", config_path.display());
    println!("  Database:      {}", db_path_str);
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit {} to set public_url and an admin token",
        config_path.display()
    );
    println!("  2. Enable identity provisioning if you use an external IdP");
    println!("  3. Run `assay serve` to start the API");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_creates_files_in_temp_dir() {
        let temp_dir = std::env::temp_dir().join("assay_test_init");
        let _ = std::fs::remove_dir_all(&temp_dir);

        let data_dir = temp_dir.to_string_lossy().to_string();
        run(&data_dir).await.unwrap();

        assert!(temp_dir.exists());

        let config_path = temp_dir.join("assay.toml");
        assert!(config_path.exists());
        let content = std::fs::read_to_string(&config_path).unwrap();
        let config: AssayConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.assay.instance_name, "My Organization");
        assert_eq!(config.assay.data_dir, data_dir);
        assert!(!config.identity.enabled);

        let db_path = temp_dir.join("assay.db");
        assert!(db_path.exists());

        let _ = std::fs::remove_dir_all(&temp_dir);
    }
}
