use std::path::Path;

use assay_core::config::{AssayConfig, DatabaseDriver};
use assay_core::db::repository::StatsRepository;
use assay_core::db::sqlite::SqliteRepository;
use assay_core::db::DatabasePool;
use tracing::info;

/// Run the `status` command: show directory statistics.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let config = AssayConfig::load(Path::new(config_path))?;
    config.validate()?;

    info!("Loaded configuration from {}", config_path);

    let (repo, driver_name, db_size) = match config.assay.database.driver {
        DatabaseDriver::Sqlite => {
            let path = config
                .assay
                .database
                .path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("SQLite path not configured"))?;
            let connect_str = format!("sqlite:{}?mode=rwc", path);
            let pool = DatabasePool::new_sqlite(&connect_str).await?;

            let size = std::fs::metadata(path)
                .map(|m| format_bytes(m.len()))
                .unwrap_or_else(|_| "unknown".to_string());

            let DatabasePool::Sqlite(sqlite_pool) = pool;
            let repo = SqliteRepository::new(sqlite_pool);
            (repo, "SQLite", size)
        }
    };

    println!("Assay Status");
    println!("============");
    println!("Instance: {}", config.assay.instance_name);
    println!("Database: {} ({})", driver_name, db_size);
    println!();

    let counts = repo.get_directory_counts().await?;
    println!("Directory Counts");
    println!("----------------");
    println!("Profiles:    {}", counts.profiles);
    println!("Assessments: {}", counts.assessments);
    println!("Assignments: {}", counts.assignments);
    println!("Surveys:     {}", counts.surveys);

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
