//! Error types for the history, gallery and project managers.

use thiserror::Error;

use crate::model::ProjectId;
use crate::settings::StorageError;
use crate::store::StoreError;

/// Errors that can occur while managing history, gallery or projects.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// Blob store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Key-value storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Project name is empty after trimming
    #[error("Project name must not be empty")]
    EmptyProjectName,

    /// No project with the given id exists
    #[error("Project not found: {id}")]
    ProjectNotFound {
        /// The missing project id
        id: ProjectId,
    },

    /// The only remaining project cannot be deleted
    #[error("Cannot delete the last project")]
    LastProject,
}

impl ManagerError {
    /// Create a project-not-found error.
    pub fn project_not_found(id: ProjectId) -> Self {
        Self::ProjectNotFound { id }
    }
}
