//! Key-value persisted settings.

mod debounce;
pub mod keys;
mod project;
mod storage;

pub use debounce::PromptDebouncer;
pub use project::{
    CameraAngle, DEFAULT_SYNTH_MODEL, ImageSize, ProjectSettings, Theme, load_brush, save_brush,
};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
