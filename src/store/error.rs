//! Error types for the blob store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing the blob store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while preparing the database location
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database was written by a newer version of the schema
    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew {
        /// Version found in the database
        found: i64,
        /// Highest version this build understands
        supported: i64,
    },

    /// Malformed `data:` URL
    #[error("Invalid data URL: {message}")]
    InvalidDataUrl {
        /// Description of the problem
        message: String,
    },

    /// Base64 payload could not be decoded
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Database file could not be opened
    #[error("Cannot open database at {path:?}: {source}")]
    Open {
        /// Location of the database file
        path: PathBuf,
        /// Underlying SQLite error
        source: rusqlite::Error,
    },
}

impl StoreError {
    /// Create an invalid data URL error.
    pub fn invalid_data_url(message: impl Into<String>) -> Self {
        Self::InvalidDataUrl {
            message: message.into(),
        }
    }
}
