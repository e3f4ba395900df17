use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Polymorphic reference to the entity a file belongs to: entity kind
/// plus entity key. Not a database-enforced foreign key; resolving the
/// concrete owner object is the host's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: String,
    pub id: String,
}

impl OwnerRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// One row of the `model_files` table. Records are immutable once
/// created; replacing a file means delete and recreate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub owner_kind: String,
    pub owner_id: String,
    pub file_type: String,
    pub name: String,
    pub extension: String,
    pub storage: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn owner(&self) -> OwnerRef {
        OwnerRef::new(self.owner_kind.clone(), self.owner_id.clone())
    }
}

/// Input for one record insert. Id and timestamps are assigned by the
/// store.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub owner: OwnerRef,
    pub file_type: String,
    pub name: String,
    pub extension: String,
    pub storage: String,
    pub path: String,
}
