//! Error types for dataset export.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while exporting a dataset.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No curated 2D bounding box records in the history
    #[error("No curated 2D bounding box detections to export")]
    NothingToExport,

    /// Reading records from the blob store failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error while writing the artifact
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Archive could not be written
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// No exporter registered under this id
    #[error("Unknown export format: {id}")]
    UnknownFormat {
        /// The requested exporter id
        id: String,
    },
}

impl ExportError {
    /// Create an unknown format error.
    pub fn unknown_format(id: impl Into<String>) -> Self {
        Self::UnknownFormat { id: id.into() }
    }
}
