//! Projects group history, gallery and settings.

use serde::{Deserialize, Serialize};

/// Project identifier (creation time in milliseconds).
pub type ProjectId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
