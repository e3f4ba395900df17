use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::config::{
    accepted_extensions, FileTypeConfig, OwnerFileConfig, DEFAULT_MAX_SIZE_KB, DEFAULT_STORAGE,
    WILDCARD_ACCEPT,
};
use super::upload::FileUpload;
use crate::error::{FilerError, Result};
use crate::records::{
    FileRecord, FileRecordRepository, FileRecordRepositoryTrait, NewFileRecord, OwnerRef,
};
use crate::storage::{DiskRegistry, StorageError};

lazy_static! {
    static ref FILE_TYPE_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// A file record, or the id to resolve one by.
#[derive(Debug, Clone)]
pub enum FileRef {
    Id(Uuid),
    Record(FileRecord),
}

impl From<Uuid> for FileRef {
    fn from(id: Uuid) -> Self {
        FileRef::Id(id)
    }
}

impl From<FileRecord> for FileRef {
    fn from(record: FileRecord) -> Self {
        FileRef::Record(record)
    }
}

/// Outcome of a bulk clear. Each file's physical delete is independent;
/// failures are collected here instead of aborting the batch.
#[derive(Debug, Default)]
pub struct ClearReport {
    pub cleared: u64,
    pub failures: Vec<ClearFailure>,
}

impl ClearReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct ClearFailure {
    pub id: Uuid,
    pub storage: String,
    pub path: String,
    pub error: StorageError,
}

/// File-management behavior for one owner class: validates uploads
/// against the class configuration, delegates bytes to the named disk,
/// and keeps the record store consistent.
#[derive(Clone)]
pub struct AttachmentManager {
    config: OwnerFileConfig,
    repository: FileRecordRepository,
    disks: Arc<DiskRegistry>,
}

impl AttachmentManager {
    pub fn new(
        config: OwnerFileConfig,
        repository: FileRecordRepository,
        disks: Arc<DiskRegistry>,
    ) -> Self {
        Self {
            config,
            repository,
            disks,
        }
    }

    /// Validate `upload` against the configuration for `file_type`,
    /// store its bytes, and create the record.
    ///
    /// `storage_override` only applies when `file_type` has no
    /// configuration and the owner class accepts any type; configured
    /// types always use their configured disk.
    pub async fn attach_file(
        &self,
        owner: &OwnerRef,
        upload: FileUpload,
        file_type: &str,
        storage_override: Option<&str>,
    ) -> Result<FileRecord> {
        if !FILE_TYPE_REGEX.is_match(file_type) {
            return Err(FilerError::Validation(format!(
                "invalid file type name: {:?}",
                file_type
            )));
        }

        let resolved = match self.config.get(file_type) {
            Some(config) => config.resolve(&owner.kind, file_type),
            None if self.config.accepts_any_type() => FileTypeConfig::new()
                .with_storage(storage_override.unwrap_or(DEFAULT_STORAGE))
                .resolve(&owner.kind, file_type),
            None => {
                return Err(FilerError::Validation(format!(
                    "file type not defined: {}",
                    file_type
                )))
            }
        };

        let max_bytes = resolved.max_size_kb * 1024;
        if upload.size() > max_bytes {
            return Err(FilerError::Validation(format!(
                "file too large: {} bytes (max: {} bytes)",
                upload.size(),
                max_bytes
            )));
        }

        if let Some(accept) = resolved.accept.as_deref() {
            if accept != WILDCARD_ACCEPT {
                let allowed = accepted_extensions(accept);
                if !allowed.iter().any(|ext| *ext == upload.extension) {
                    return Err(FilerError::Validation(format!(
                        "extension not allowed: {:?} (accepted: {})",
                        upload.extension, accept
                    )));
                }
            }
        }

        if resolved.unique {
            self.replace_existing(owner, file_type).await?;
        }

        let disk = self.disks.get(&resolved.storage)?;
        // The disk returns the normalized key of the stored object;
        // the record carries it verbatim.
        let path = disk
            .store(&resolved.path, &upload.extension, &upload.data)
            .await?;

        debug!(
            owner = %owner,
            file_type,
            storage = %resolved.storage,
            %path,
            content_type = %upload.content_type,
            "stored attachment"
        );

        self.repository
            .create(NewFileRecord {
                owner: owner.clone(),
                file_type: file_type.to_string(),
                name: upload.original_name,
                extension: upload.extension,
                storage: resolved.storage,
                path,
            })
            .await
    }

    /// Replace-on-write: drop any existing file of this type before the
    /// new one is stored.
    async fn replace_existing(&self, owner: &OwnerRef, file_type: &str) -> Result<()> {
        let existing = self.repository.find_by_owner(owner, Some(file_type)).await?;
        for record in existing {
            let disk = self.disks.get(&record.storage)?;
            match disk.delete(&record.path).await {
                Ok(()) => {}
                Err(StorageError::NotFound(_)) => {
                    warn!(id = %record.id, path = %record.path, "replaced file had no stored object");
                }
                Err(e) => return Err(e.into()),
            }
            self.repository.delete(record.id).await?;
        }
        Ok(())
    }

    /// All records for `owner`, optionally filtered by type, in
    /// insertion order.
    pub async fn list_files(
        &self,
        owner: &OwnerRef,
        file_type: Option<&str>,
    ) -> Result<Vec<FileRecord>> {
        self.repository.find_by_owner(owner, file_type).await
    }

    pub async fn count_files(&self, owner: &OwnerRef, file_type: Option<&str>) -> Result<u64> {
        self.repository.count_by_owner(owner, file_type).await
    }

    /// Delete every matching file, bytes first, then the record. A
    /// physical-delete failure keeps that record and is reported; the
    /// rest of the batch still runs.
    pub async fn clear_files(
        &self,
        owner: &OwnerRef,
        file_type: Option<&str>,
    ) -> Result<ClearReport> {
        let records = self.repository.find_by_owner(owner, file_type).await?;
        let mut report = ClearReport::default();

        for record in records {
            let disk = match self.disks.get(&record.storage) {
                Ok(disk) => disk,
                Err(error) => {
                    report.failures.push(ClearFailure {
                        id: record.id,
                        storage: record.storage.clone(),
                        path: record.path.clone(),
                        error,
                    });
                    continue;
                }
            };

            match disk.delete(&record.path).await {
                Ok(()) => {}
                Err(StorageError::NotFound(_)) => {
                    warn!(id = %record.id, path = %record.path, "stored object already missing");
                }
                Err(error) => {
                    report.failures.push(ClearFailure {
                        id: record.id,
                        storage: record.storage.clone(),
                        path: record.path.clone(),
                        error,
                    });
                    continue;
                }
            }

            self.repository.delete(record.id).await?;
            report.cleared += 1;
        }

        if !report.is_complete() {
            warn!(
                owner = %owner,
                cleared = report.cleared,
                failed = report.failures.len(),
                "clear finished with failures"
            );
        }

        Ok(report)
    }

    /// Delete one file after checking it belongs to `owner`.
    pub async fn delete_file(&self, owner: &OwnerRef, file: impl Into<FileRef>) -> Result<()> {
        let record = match file.into() {
            FileRef::Record(record) => record,
            FileRef::Id(id) => self
                .repository
                .find_by_id(id)
                .await?
                .ok_or_else(|| FilerError::NotFound(format!("file record {} not found", id)))?,
        };

        if record.owner() != *owner {
            return Err(FilerError::Validation(
                "file does not belong to this owner".to_string(),
            ));
        }

        let disk = self.disks.get(&record.storage)?;
        match disk.delete(&record.path).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                warn!(id = %record.id, path = %record.path, "stored object already missing");
            }
            Err(e) => return Err(e.into()),
        }

        self.repository.delete(record.id).await
    }

    /// Fetch one file's record and bytes after checking ownership.
    pub async fn read_file(&self, owner: &OwnerRef, id: Uuid) -> Result<(FileRecord, Vec<u8>)> {
        let record = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| FilerError::NotFound(format!("file record {} not found", id)))?;

        if record.owner() != *owner {
            return Err(FilerError::Validation(
                "file does not belong to this owner".to_string(),
            ));
        }

        let disk = self.disks.get(&record.storage)?;
        let data = disk.read(&record.path).await?;
        Ok((record, data))
    }

    /// Drop records whose stored object no longer exists. Returns how
    /// many records were removed.
    pub async fn prune_missing(&self, owner: &OwnerRef) -> Result<u64> {
        let mut pruned = 0;
        for record in self.repository.find_by_owner(owner, None).await? {
            let disk = self.disks.get(&record.storage)?;
            if !disk.exists(&record.path).await? {
                warn!(id = %record.id, path = %record.path, "removing record for missing stored object");
                self.repository.delete(record.id).await?;
                pruned += 1;
            }
        }
        Ok(pruned)
    }

    /// The configured accept value for `file_type`, or `""` when the
    /// type is unknown or unconstrained.
    pub fn accept_string(&self, file_type: &str) -> String {
        self.config
            .get(file_type)
            .and_then(|config| config.accept.clone())
            .unwrap_or_default()
    }

    /// Declarative upload rule for `file_type`, for an external
    /// validation layer: e.g. `"required|file|mimes:jpg,png|max:2048"`.
    pub fn validation_rule(&self, file_type: &str, required: bool) -> String {
        let mut parts = vec![
            if required { "required" } else { "nullable" }.to_string(),
            "file".to_string(),
        ];

        let config = self.config.get(file_type);

        if let Some(accept) = config.and_then(|c| c.accept.as_deref()) {
            if accept != WILDCARD_ACCEPT {
                let extensions = accepted_extensions(accept);
                if !extensions.is_empty() {
                    parts.push(format!("mimes:{}", extensions.join(",")));
                }
            }
        }

        let max_size_kb = config
            .and_then(|c| c.max_size_kb)
            .unwrap_or(DEFAULT_MAX_SIZE_KB);
        parts.push(format!("max:{}", max_size_kb));

        parts.join("|")
    }
}
