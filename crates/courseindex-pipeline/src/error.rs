//! Pipeline error taxonomy.
//!
//! `IndexError` is the umbrella the driver reports. Decode and storage
//! failures keep their own types underneath so callers can tell a malformed
//! event from a database outage.

use thiserror::Error;

use courseindex_core::{DecodeError, NormalizeError};
use courseindex_store::StorageError;

/// Top-level pipeline error.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("block source error: {0}")]
    Source(String),
}
