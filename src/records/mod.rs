//! The file record store: persisted metadata rows and polymorphic
//! lookup by owner.

pub mod models;
pub mod repository;

pub use models::{FileRecord, NewFileRecord, OwnerRef};
pub use repository::{FileRecordRepository, FileRecordRepositoryTrait};
