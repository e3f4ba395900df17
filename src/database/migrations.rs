//! Versioned schema migrations. Running them at startup is the only
//! registration the host needs before attaching files.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{error, info};

use crate::error::{FilerError, Result};

pub struct MigrationManager {
    pool: SqlitePool,
}

impl MigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        self.create_migrations_table().await?;

        let current_version = self.get_current_version().await?;
        let migrations = self.get_migrations();
        let mut applied_count = 0;

        for migration in migrations {
            if migration.version > current_version {
                info!("applying migration {}: {}", migration.version, migration.name);
                self.apply_migration(&migration).await?;
                applied_count += 1;
            }
        }

        if applied_count > 0 {
            info!("applied {} migrations", applied_count);
        }

        Ok(())
    }

    async fn create_migrations_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _fileable_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(FilerError::from)?;

        Ok(())
    }

    async fn get_current_version(&self) -> Result<i64> {
        let result = sqlx::query("SELECT MAX(version) as version FROM _fileable_migrations")
            .fetch_optional(&self.pool)
            .await
            .map_err(FilerError::from)?;

        match result {
            Some(row) => Ok(row.try_get("version").unwrap_or(0)),
            None => Ok(0),
        }
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(FilerError::from)?;

        for statement in &migration.sql_statements {
            sqlx::query(statement).execute(&mut *tx).await.map_err(|e| {
                error!("failed to execute migration statement: {}", e);
                FilerError::from(e)
            })?;
        }

        sqlx::query("INSERT INTO _fileable_migrations (version, name) VALUES (?, ?)")
            .bind(migration.version)
            .bind(&migration.name)
            .execute(&mut *tx)
            .await
            .map_err(FilerError::from)?;

        tx.commit().await.map_err(FilerError::from)?;
        Ok(())
    }

    fn get_migrations(&self) -> Vec<Migration> {
        vec![Migration {
            version: 1,
            name: "create_model_files_table".to_string(),
            sql_statements: vec![
                r#"
                CREATE TABLE model_files (
                    id TEXT PRIMARY KEY,
                    owner_kind TEXT NOT NULL,
                    owner_id TEXT NOT NULL,
                    type TEXT NOT NULL,
                    name TEXT NOT NULL,
                    extension TEXT NOT NULL,
                    storage TEXT NOT NULL DEFAULT 'local',
                    path TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#
                .to_string(),
                r#"
                CREATE INDEX idx_model_files_owner ON model_files(owner_kind, owner_id)
                "#
                .to_string(),
                r#"
                CREATE INDEX idx_model_files_owner_type ON model_files(owner_kind, owner_id, type)
                "#
                .to_string(),
            ],
        }]
    }

    pub async fn get_migration_history(&self) -> Result<Vec<MigrationRecord>> {
        let rows = sqlx::query(
            "SELECT version, name, applied_at FROM _fileable_migrations ORDER BY version",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(FilerError::from)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(MigrationRecord {
                version: row.try_get("version").unwrap_or(0),
                name: row.try_get("name").unwrap_or_default(),
                applied_at: row.try_get("applied_at").unwrap_or_else(|_| Utc::now()),
            });
        }

        Ok(records)
    }
}

#[derive(Debug, Clone)]
struct Migration {
    version: i64,
    name: String,
    sql_statements: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

pub async fn run_migrations(pool: SqlitePool) -> Result<()> {
    let migration_manager = MigrationManager::new(pool);
    migration_manager.run_migrations().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    async fn test_pool() -> (SqlitePool, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let database_url = format!("sqlite:{}", temp_file.path().display());
        let pool = SqlitePool::connect(&database_url).await.unwrap();
        (pool, temp_file)
    }

    #[tokio::test]
    async fn migrations_create_the_table() {
        let (pool, _db) = test_pool().await;
        let manager = MigrationManager::new(pool.clone());

        manager.run_migrations().await.unwrap();

        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM sqlite_master WHERE type='table' AND name='model_files'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(row.get::<i64, _>("count"), 1);

        let history = manager.get_migration_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "create_model_files_table");
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let (pool, _db) = test_pool().await;

        run_migrations(pool.clone()).await.unwrap();
        run_migrations(pool.clone()).await.unwrap();

        let manager = MigrationManager::new(pool);
        assert_eq!(manager.get_migration_history().await.unwrap().len(), 1);
    }
}
