//! In-memory disk for tests and embedded hosts.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{normalize_path, Disk, StorageError};

#[derive(Default)]
pub struct MemoryDisk {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryDisk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl Disk for MemoryDisk {
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
        let path = normalize_path(&format!("{}/{}", prefix, object_name));

        self.objects.write().insert(path.clone(), data.to_vec());
        Ok(path)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.objects
            .write()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_read_delete_round_trip() {
        let disk = MemoryDisk::new();

        let path = disk.store("users/avatar", "png", b"pixels").await.unwrap();
        assert_eq!(disk.read(&path).await.unwrap(), b"pixels");
        assert_eq!(disk.object_count(), 1);

        disk.delete(&path).await.unwrap();
        assert!(disk.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_object_is_not_found() {
        let disk = MemoryDisk::new();
        assert!(matches!(
            disk.delete("nope.png").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn store_normalizes_the_returned_key() {
        let disk = MemoryDisk::new();

        let path = disk.store("avatars//123", "png", b"x").await.unwrap();
        assert!(path.starts_with("avatars/123/"));
        assert!(!path.contains("//"));

        // The returned path is the key the object lives under.
        assert_eq!(disk.read(&path).await.unwrap(), b"x");
        disk.delete(&path).await.unwrap();
        assert!(disk.is_empty());
    }

    #[tokio::test]
    async fn distinct_stores_never_collide() {
        let disk = MemoryDisk::new();

        let a = disk.store("p", "txt", b"one").await.unwrap();
        let b = disk.store("p", "txt", b"two").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(disk.object_count(), 2);
    }
}
