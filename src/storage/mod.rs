//! Named storage backends ("disks") holding the physical file bytes.
//!
//! The record store never touches bytes itself: every write and delete is
//! delegated to a [`Disk`] resolved by name through the [`DiskRegistry`],
//! so one owner class can keep avatars on the local filesystem and
//! invoices on some other backend.

pub mod local;
pub mod memory;

pub use local::LocalDisk;
pub use memory::MemoryDisk;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("unknown disk: {0}")]
    UnknownDisk(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("path escapes disk root: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One storage backend. Objects live at disk-relative paths; the disk
/// picks the object name when storing so callers never collide.
#[async_trait]
pub trait Disk: Send + Sync {
    /// Store bytes under `prefix` and return the disk-relative path of
    /// the new object. The returned path is the exact key the object is
    /// addressable by: implementations collapse repeated separators
    /// before storing, so callers can persist it as-is.
    async fn store(
        &self,
        prefix: &str,
        extension: &str,
        data: &[u8],
    ) -> std::result::Result<String, StorageError>;

    /// Read back all bytes of one object.
    async fn read(&self, path: &str) -> std::result::Result<Vec<u8>, StorageError>;

    /// Delete one object. Fails with [`StorageError::NotFound`] when no
    /// object exists at `path`.
    async fn delete(&self, path: &str) -> std::result::Result<(), StorageError>;

    async fn exists(&self, path: &str) -> std::result::Result<bool, StorageError>;
}

/// Disks addressable by name.
#[derive(Default)]
pub struct DiskRegistry {
    disks: RwLock<HashMap<String, Arc<dyn Disk>>>,
}

impl DiskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, disk: Arc<dyn Disk>) {
        self.disks.write().insert(name.into(), disk);
    }

    pub fn get(&self, name: &str) -> std::result::Result<Arc<dyn Disk>, StorageError> {
        self.disks
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::UnknownDisk(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.disks.read().contains_key(name)
    }
}

/// Collapse runs of `/` and strip leading/trailing separators so the
/// persisted path has one canonical spelling.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_repeated_separators() {
        assert_eq!(normalize_path("avatars//123"), "avatars/123");
        assert_eq!(normalize_path("a///b//c.png"), "a/b/c.png");
    }

    #[test]
    fn normalize_strips_leading_and_trailing_separators() {
        assert_eq!(normalize_path("/avatars/123/"), "avatars/123");
    }

    #[test]
    fn normalize_leaves_clean_paths_alone() {
        assert_eq!(normalize_path("users/avatar/f.png"), "users/avatar/f.png");
    }

    #[test]
    fn registry_resolves_registered_disks() {
        let registry = DiskRegistry::new();
        registry.register("mem", Arc::new(MemoryDisk::new()));

        assert!(registry.contains("mem"));
        assert!(registry.get("mem").is_ok());
    }

    #[test]
    fn registry_rejects_unknown_disk() {
        let registry = DiskRegistry::new();
        let err = registry.get("s3").unwrap_err();
        assert!(matches!(err, StorageError::UnknownDisk(name) if name == "s3"));
    }
}
