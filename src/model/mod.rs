//! Data models for vdat.

mod history;
mod metadata;
mod project;
mod shape;

pub use history::{
    BoundingBox2D, DetectType, HistoryItem, HistoryResult, PromptState, RecordKey,
};
pub use metadata::{QualityMetadata, UserRating};
pub use project::{Project, ProjectId};
pub use shape::{
    BrushSettings, BrushShape, RoiShape, RoiTool, ShapeId, ShapeKind, ShapePatch,
};
