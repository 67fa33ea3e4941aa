//! Store-level error type.

use thiserror::Error;

/// A persistence failure: constraint violation other than the expected
/// conflict target, connectivity loss, or schema trouble.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage error: {0}")]
    Storage(String),
}

#[cfg(any(feature = "sqlite", feature = "postgres"))]
impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
