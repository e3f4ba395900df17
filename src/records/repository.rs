use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::models::{FileRecord, NewFileRecord, OwnerRef};
use crate::error::{FilerError, Result};

#[async_trait]
pub trait FileRecordRepositoryTrait: Send + Sync {
    async fn create(&self, new: NewFileRecord) -> Result<FileRecord>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>>;
    async fn find_by_owner(
        &self,
        owner: &OwnerRef,
        file_type: Option<&str>,
    ) -> Result<Vec<FileRecord>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn count_by_owner(&self, owner: &OwnerRef, file_type: Option<&str>) -> Result<u64>;
}

const SELECT_COLUMNS: &str =
    "id, owner_kind, owner_id, type, name, extension, storage, path, created_at, updated_at";

#[derive(Clone)]
pub struct FileRecordRepository {
    pool: SqlitePool,
}

impl FileRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<FileRecord> {
        Ok(FileRecord {
            id: Uuid::parse_str(&row.get::<String, _>("id"))
                .map_err(|e| FilerError::Database(format!("invalid UUID in id column: {}", e)))?,
            owner_kind: row.get("owner_kind"),
            owner_id: row.get("owner_id"),
            file_type: row.get("type"),
            name: row.get("name"),
            extension: row.get("extension"),
            storage: row.get("storage"),
            path: row.get("path"),
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
            updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FilerError::Database(format!("invalid timestamp: {}", e)))
}

#[async_trait]
impl FileRecordRepositoryTrait for FileRecordRepository {
    async fn create(&self, new: NewFileRecord) -> Result<FileRecord> {
        // `extension` may be empty (extensionless uploads) and `storage`
        // always resolves to a default before it gets here.
        let required = [
            ("owner kind", &new.owner.kind),
            ("owner id", &new.owner.id),
            ("type", &new.file_type),
            ("name", &new.name),
            ("path", &new.path),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(FilerError::Validation(format!("{} must not be empty", field)));
            }
        }

        let record = FileRecord {
            id: Uuid::new_v4(),
            owner_kind: new.owner.kind,
            owner_id: new.owner.id,
            file_type: new.file_type,
            name: new.name,
            extension: new.extension,
            storage: new.storage,
            path: new.path,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO model_files (id, owner_kind, owner_id, type, name, extension, storage, path, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.owner_kind)
        .bind(&record.owner_id)
        .bind(&record.file_type)
        .bind(&record.name)
        .bind(&record.extension)
        .bind(&record.storage)
        .bind(&record.path)
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM model_files WHERE id = ?1",
            SELECT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::record_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_owner(
        &self,
        owner: &OwnerRef,
        file_type: Option<&str>,
    ) -> Result<Vec<FileRecord>> {
        // rowid preserves insertion order.
        let mut sql = format!(
            "SELECT {} FROM model_files WHERE owner_kind = ?1 AND owner_id = ?2",
            SELECT_COLUMNS
        );
        if file_type.is_some() {
            sql.push_str(" AND type = ?3");
        }
        sql.push_str(" ORDER BY rowid");

        let mut query = sqlx::query(&sql).bind(&owner.kind).bind(&owner.id);
        if let Some(file_type) = file_type {
            query = query.bind(file_type);
        }

        let rows = query.fetch_all(&self.pool).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(Self::record_from_row(&row)?);
        }
        Ok(records)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let rows_affected = sqlx::query("DELETE FROM model_files WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(FilerError::NotFound(format!("file record {} not found", id)));
        }

        Ok(())
    }

    async fn count_by_owner(&self, owner: &OwnerRef, file_type: Option<&str>) -> Result<u64> {
        let mut sql =
            "SELECT COUNT(*) as count FROM model_files WHERE owner_kind = ?1 AND owner_id = ?2"
                .to_string();
        if file_type.is_some() {
            sql.push_str(" AND type = ?3");
        }

        let mut query = sqlx::query(&sql).bind(&owner.kind).bind(&owner.id);
        if let Some(file_type) = file_type {
            query = query.bind(file_type);
        }

        let row = query.fetch_one(&self.pool).await?;
        Ok(row.get::<i64, _>("count") as u64)
    }
}
