// file: src/database/mod.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub mod kv;
pub mod notifications;
pub mod settings;

pub use kv::SqliteStore;
pub use notifications::SqliteNotifier;

/// Database file override.
pub const DB_PATH_ENV: &str = "CLASSCHIME_DB";

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

/// `$CLASSCHIME_DB`, else `<data dir>/classchime/classchime.db`, else a file in
/// the working directory.
pub fn default_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path.trim());
        }
    }
    match dirs::data_dir() {
        Some(dir) => dir.join("classchime").join("classchime.db"),
        None => PathBuf::from("classchime.db"),
    }
}

impl Database {
    pub async fn new() -> Result<Self> {
        Self::open(&default_path()).await
    }

    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let db_url = format!("sqlite:{}?mode=rwc", path.display());

        let db_exists = Sqlite::database_exists(&db_url)
            .await
            .context("Failed to check if database exists")?;
        if !db_exists {
            info!("Creating database at {}", path.display());
            Sqlite::create_database(&db_url)
                .await
                .context("Failed to create database")?;
        }

        let pool = SqlitePool::connect(&db_url)
            .await
            .context("Failed to connect to database")?;

        run_schema(&pool).await.context("Failed to run database schema")?;

        info!("Database initialized successfully");

        Ok(Database { pool })
    }

    /// Private in-memory database on a single connection.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        run_schema(&pool).await.context("Failed to run database schema")?;
        Ok(Database { pool })
    }

    // --- Settings Delegates ---

    pub async fn get_settings(&self) -> Result<crate::models::Settings> {
        settings::get(&self.pool).await
    }

    pub async fn update_settings(&self, settings: &crate::models::Settings) -> Result<()> {
        settings::update(&self.pool, settings).await
    }

    pub fn store(&self) -> SqliteStore {
        SqliteStore::new(self.pool.clone())
    }

    pub fn notifier(&self) -> SqliteNotifier {
        SqliteNotifier::new(self.pool.clone())
    }
}

async fn run_schema(pool: &SqlitePool) -> Result<()> {
    let schema = include_str!("schema.sql");

    let mut current_statement = String::new();
    let mut in_trigger = false;

    for line in schema.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }

        if trimmed.to_uppercase().starts_with("CREATE TRIGGER") {
            in_trigger = true;
        }

        current_statement.push_str(line);
        current_statement.push('\n');

        if trimmed.ends_with(';') {
            if in_trigger {
                if trimmed.to_uppercase() == "END;" {
                    in_trigger = false;
                    sqlx::query(&current_statement).execute(pool).await?;
                    current_statement.clear();
                }
            } else {
                sqlx::query(&current_statement).execute(pool).await?;
                current_statement.clear();
            }
        }
    }
    Ok(())
}
