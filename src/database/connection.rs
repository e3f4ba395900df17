use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::error::{FilerError, Result};

pub async fn connect_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    info!("connecting to database: {}", config.url);

    let connect_options = SqliteConnectOptions::from_str(&config.url)
        .map_err(FilerError::from)?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            error!("failed to create database pool: {}", e);
            FilerError::from(e)
        })?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .map_err(FilerError::from)?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await
        .map_err(FilerError::from)?;

    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await
        .map_err(FilerError::from)?;

    sqlx::query("PRAGMA busy_timeout = 30000")
        .execute(&pool)
        .await
        .map_err(FilerError::from)?;

    info!("database connection pool created");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn connects_and_answers_queries() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite:{}", temp_file.path().display()),
            ..DatabaseConfig::default()
        };

        let pool = connect_pool(&config).await.unwrap();
        let result = sqlx::query("SELECT 1").fetch_one(&pool).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn creates_missing_database_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fresh.db");
        let config = DatabaseConfig {
            url: format!("sqlite:{}", path.display()),
            ..DatabaseConfig::default()
        };

        connect_pool(&config).await.unwrap();
        assert!(path.exists());
    }
}
