//! Storage key layout.
//!
//! Global keys are plain names. Project-scoped settings use
//! `{base}-{projectId}`; the history list uses `history-{projectId}`.

use crate::model::ProjectId;

pub const PROJECTS: &str = "projects";
pub const ACTIVE_PROJECT_ID: &str = "activeProjectId";
pub const THEME: &str = "theme";
pub const TUTORIAL_SEEN: &str = "tutorialSeen";
pub const BRUSH_SIZE: &str = "brushSize";
pub const BRUSH_OPACITY: &str = "brushOpacity";
pub const BRUSH_SHAPE: &str = "brushShape";

pub const SYNTH_MODEL: &str = "synthModel";
pub const IMAGE_SIZE: &str = "imageSize";
pub const EDIT_PROMPT: &str = "editPrompt";
pub const BATCH_COUNT: &str = "batchCount";
pub const CHAINED_MODE: &str = "isChainedMode";
pub const BG_REPLACE_MODE: &str = "isBgReplaceMode";
pub const MIN_QUALITY: &str = "minQuality";
pub const CAMERA_ANGLE: &str = "cameraAngle";

/// Base names of every project-scoped setting.
pub const PROJECT_SCOPED: [&str; 8] = [
    SYNTH_MODEL,
    IMAGE_SIZE,
    EDIT_PROMPT,
    BATCH_COUNT,
    CHAINED_MODE,
    BG_REPLACE_MODE,
    MIN_QUALITY,
    CAMERA_ANGLE,
];

pub fn project_scoped(base: &str, project_id: ProjectId) -> String {
    format!("{}-{}", base, project_id)
}

pub fn history(project_id: ProjectId) -> String {
    project_scoped("history", project_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(history(1700000000000), "history-1700000000000");
        assert_eq!(project_scoped(EDIT_PROMPT, 3), "editPrompt-3");
    }
}
