use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

/// Database manager for persistent gatepass storage
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// Connect to the configured database, creating it when missing, and run
    /// migrations if enabled
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        if let Some(path) = config
            .url
            .strip_prefix("sqlite://")
            .and_then(|rest| std::path::Path::new(rest).parent())
        {
            if !path.as_os_str().is_empty() {
                std::fs::create_dir_all(path)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .foreign_keys(true);

        info!("Connecting to database at {}", config.url);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect_with(options)
            .await?;

        let manager = Self { pool };
        if config.auto_migrate {
            manager.migrate().await?;
        }

        Ok(manager)
    }

    /// Private in-memory database, migrated and ready. A single connection
    /// is kept open for the life of the pool because the data lives in it.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let manager = Self { pool };
        manager.migrate().await?;
        Ok(manager)
    }

    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get database pool for queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close database connections gracefully
    pub async fn shutdown(&self) {
        info!("Shutting down database connections...");
        self.pool.close().await;
        info!("Database connections closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_database_created_and_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}/nested/gatepass.db", dir.path().display()),
            max_connections: 2,
            auto_migrate: true,
            busy_timeout_ms: 1_000,
            acquire_timeout_ms: 1_000,
        };

        let manager = DatabaseManager::new(&config).await.unwrap();
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('gatepasses', 'gatepass_items', 'audit_logs', 'users') ORDER BY name",
        )
        .fetch_all(manager.pool())
        .await
        .unwrap();

        assert_eq!(tables.len(), 4);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_audit_log_is_append_only() {
        let manager = DatabaseManager::in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO audit_logs (actor_id, action, detail, created_at) VALUES (NULL, 'create_gatepass', 'x', '2025-01-01T00:00:00.000000Z')",
        )
        .execute(manager.pool())
        .await
        .unwrap();

        assert!(sqlx::query("UPDATE audit_logs SET detail = 'y'")
            .execute(manager.pool())
            .await
            .is_err());
        assert!(sqlx::query("DELETE FROM audit_logs")
            .execute(manager.pool())
            .await
            .is_err());
    }
}
