//! Filesystem disk rooted at a single directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{normalize_path, Disk, StorageError};

/// Local filesystem backend. All objects live under `root`; relative
/// paths that would escape it are rejected.
pub struct LocalDisk {
    root: PathBuf,
}

impl LocalDisk {
    pub async fn new(root: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Disk for LocalDisk {
    async fn store(
        &self,
        prefix: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<String, StorageError> {
        let object_name = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), extension)
        };
        // The returned path must equal the stored key.
        let relative = normalize_path(&format!("{}/{}", prefix, object_name));

        let target = self.absolute(&relative)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&target).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        Ok(relative)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self.absolute(path)?;
        match fs::read(&target).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let target = self.absolute(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let target = self.absolute(path)?;
        Ok(fs::try_exists(&target).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_disk() -> (LocalDisk, TempDir) {
        let dir = TempDir::new().unwrap();
        let disk = LocalDisk::new(dir.path().join("objects")).await.unwrap();
        (disk, dir)
    }

    #[tokio::test]
    async fn store_read_round_trip() {
        let (disk, _dir) = temp_disk().await;

        let path = disk.store("users/avatar", "png", b"bytes").await.unwrap();
        assert!(path.starts_with("users/avatar/"));
        assert!(path.ends_with(".png"));

        let data = disk.read(&path).await.unwrap();
        assert_eq!(data, b"bytes");
        assert!(disk.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn store_without_extension_or_prefix() {
        let (disk, _dir) = temp_disk().await;

        let path = disk.store("", "", b"raw").await.unwrap();
        assert!(!path.contains('/'));
        assert!(!path.contains('.'));
        assert_eq!(disk.read(&path).await.unwrap(), b"raw");
    }

    #[tokio::test]
    async fn store_normalizes_the_returned_key() {
        let (disk, _dir) = temp_disk().await;

        let path = disk.store("avatars//123", "png", b"x").await.unwrap();
        assert!(path.starts_with("avatars/123/"));
        assert!(!path.contains("//"));

        assert_eq!(disk.read(&path).await.unwrap(), b"x");
        disk.delete(&path).await.unwrap();
        assert!(!disk.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_object() {
        let (disk, _dir) = temp_disk().await;

        let path = disk.store("docs", "pdf", b"pdf bytes").await.unwrap();
        disk.delete(&path).await.unwrap();

        assert!(!disk.exists(&path).await.unwrap());
        assert!(matches!(
            disk.read(&path).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_missing_object_is_not_found() {
        let (disk, _dir) = temp_disk().await;
        assert!(matches!(
            disk.delete("docs/missing.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let (disk, _dir) = temp_disk().await;

        assert!(matches!(
            disk.read("../outside.txt").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            disk.delete("/etc/passwd").await,
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn constructor_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("deep/nested/objects");
        assert!(!root.exists());

        let _disk = LocalDisk::new(root.clone()).await.unwrap();
        assert!(root.exists());
    }
}
