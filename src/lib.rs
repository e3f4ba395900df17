//! Polymorphic file attachments for database-backed entities.
//!
//! Any entity identified by an [`OwnerRef`] (kind + key) can hold a
//! collection of uploaded files. Metadata lives in a `model_files`
//! table; bytes live on named storage backends behind the [`Disk`]
//! trait. Per-owner-class rules (accepted extensions, size bounds,
//! uniqueness, placement) are declared as an [`OwnerFileConfig`] and
//! enforced by the [`AttachmentManager`].

pub mod attachments;
pub mod config;
pub mod database;
pub mod error;
pub mod records;
pub mod storage;

pub use attachments::{
    AttachmentManager, ClearFailure, ClearReport, FileRef, FileTypeConfig, FileUpload,
    OwnerFileConfig,
};
pub use config::{DatabaseConfig, FilerConfig, StorageConfig};
pub use database::{connect_pool, run_migrations, MigrationManager};
pub use error::{FilerError, Result};
pub use records::{
    FileRecord, FileRecordRepository, FileRecordRepositoryTrait, NewFileRecord, OwnerRef,
};
pub use storage::{Disk, DiskRegistry, LocalDisk, MemoryDisk, StorageError};

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info;

/// Startup wiring: owns the connection pool and the disk registry, and
/// hands out [`AttachmentManager`]s that share both.
#[derive(Clone)]
pub struct Filer {
    pool: SqlitePool,
    disks: Arc<DiskRegistry>,
}

impl Filer {
    /// Connect the pool, apply migrations (when configured), and
    /// register the local disk under the configured name.
    pub async fn connect(config: &FilerConfig) -> Result<Self> {
        let pool = database::connect_pool(&config.database).await?;

        if config.database.migrate_on_start {
            database::run_migrations(pool.clone()).await?;
        }

        let disks = DiskRegistry::new();
        let local = LocalDisk::new(config.storage.root.clone()).await?;
        disks.register(&config.storage.disk_name, Arc::new(local));

        info!(disk = %config.storage.disk_name, "file attachment store initialized");

        Ok(Self {
            pool,
            disks: Arc::new(disks),
        })
    }

    /// Embed into a host-managed pool. No migrations are run and no
    /// disks are registered; the host wires both itself.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            disks: Arc::new(DiskRegistry::new()),
        }
    }

    pub fn register_disk(&self, name: impl Into<String>, disk: Arc<dyn Disk>) {
        self.disks.register(name, disk);
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn disks(&self) -> Arc<DiskRegistry> {
        self.disks.clone()
    }

    /// An attachment manager for one owner class.
    pub fn attachments(&self, owner_config: OwnerFileConfig) -> AttachmentManager {
        AttachmentManager::new(
            owner_config,
            FileRecordRepository::new(self.pool.clone()),
            self.disks.clone(),
        )
    }
}
