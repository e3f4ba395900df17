//! Library error types and handling

use thiserror::Error;

use crate::storage::StorageError;

pub type Result<T> = std::result::Result<T, FilerError>;

#[derive(Error, Debug)]
pub enum FilerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Storage(#[from] StorageError),

    #[error("database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FilerError {
    /// Whether the caller can fix the failure by changing its input.
    pub fn is_validation(&self) -> bool {
        matches!(self, FilerError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FilerError::NotFound(_))
    }
}

impl From<sqlx::Error> for FilerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => FilerError::NotFound("record not found".to_string()),
            _ => FilerError::Database(err.to_string()),
        }
    }
}
