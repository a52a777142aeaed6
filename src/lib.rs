//! vdat - Visual Dataset Authoring Toolkit
//!
//! Core of an image dataset authoring tool: regions of interest drawn over
//! an image, a persistent store for generated images and detection results,
//! bounded per-project history and gallery views, and COCO/YOLO export of
//! curated bounding boxes.

pub mod config;
pub mod constants;
pub mod detection;
pub mod editor;
pub mod format;
pub mod geometry;
pub mod id;
pub mod manager;
pub mod model;
pub mod roi;
pub mod settings;
pub mod store;
pub mod thumbnail;
pub mod viewport;
pub mod workspace;

pub use editor::EditorState;
pub use workspace::{Workspace, WorkspaceError};
