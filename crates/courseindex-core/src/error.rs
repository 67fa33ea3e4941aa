//! Error types for event decoding and normalization.

use thiserror::Error;

/// Errors raised when a raw event's shape does not match its declared layout.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("event carries no key words")]
    MissingKey,

    #[error("selector mismatch for {kind}: expected {expected}, got {actual}")]
    SelectorMismatch {
        kind: &'static str,
        expected: String,
        actual: String,
    },

    #[error("{kind} expects {expected} data words, got {actual}")]
    FieldCountMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("missing field '{field}'")]
    MissingField { field: String },

    #[error("field '{field}' holds a different type than requested")]
    FieldType { field: String },

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Errors raised when converting chain-native scalar encodings to storage types.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The on-chain word does not fit the 64-bit signed target. Values are
    /// rejected rather than wrapped or saturated.
    #[error("field '{field}' overflows i64: {value}")]
    Overflow { field: String, value: String },

    #[error("field '{field}' is not valid UTF-8")]
    Encoding { field: String },

    #[error("field '{field}' is not a boolean word: {value}")]
    Boolean { field: String, value: String },

    #[error("field '{field}' is not a valid field element: {value}")]
    InvalidFelt { field: String, value: String },
}
