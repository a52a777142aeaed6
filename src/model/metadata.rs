//! Quality metadata attached to gallery images.

use serde::{Deserialize, Serialize};

use crate::model::project::ProjectId;
use crate::model::shape::RoiShape;

/// Thumbs up/down given by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRating {
    Up,
    Down,
}

/// Quality assessment of a generated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetadata {
    pub project_id: ProjectId,
    /// Score from 0 to 100.
    pub quality_score: f64,
    pub quality_feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement_suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<UserRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_comment: Option<String>,
    /// Regions of interest active when the image was generated.
    #[serde(default)]
    pub rois: Vec<RoiShape>,
}

impl QualityMetadata {
    pub fn new(project_id: ProjectId, quality_score: f64, quality_feedback: impl Into<String>) -> Self {
        Self {
            project_id,
            quality_score,
            quality_feedback: quality_feedback.into(),
            improvement_suggestion: None,
            user_rating: None,
            user_comment: None,
            rois: Vec::new(),
        }
    }

    pub fn with_rois(mut self, rois: Vec<RoiShape>) -> Self {
        self.rois = rois;
        self
    }
}
