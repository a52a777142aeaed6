//! Global constants for vdat.

use std::time::Duration;

/// Maximum number of history records kept per project (most recent first).
pub const HISTORY_LIMIT: usize = 30;

/// Maximum number of gallery images kept per project (most recent first).
pub const GALLERY_LIMIT: usize = 50;

/// Longest side of generated thumbnails, in pixels.
pub const THUMBNAIL_SIZE: u32 = 128;

/// JPEG quality used when encoding thumbnails.
pub const THUMBNAIL_JPEG_QUALITY: u8 = 80;

/// Scale of the per-mille coordinates returned by detection models.
pub const PER_MILLE: f64 = 1000.0;

/// Viewport zoom limits and button step.
pub mod zoom {
    /// Smallest allowed zoom level.
    pub const MIN: f64 = 0.5;
    /// Largest allowed zoom level.
    pub const MAX: f64 = 5.0;
    /// Zoom change applied by the zoom in/out buttons.
    pub const STEP: f64 = 0.25;
}

/// Brush defaults (global, not project-scoped).
pub mod brush {
    /// Default brush diameter in screen pixels.
    pub const DEFAULT_SIZE: u32 = 40;
    /// Default brush stroke opacity.
    pub const DEFAULT_OPACITY: f64 = 0.6;
}

/// Delay before a changed edit prompt is written to storage.
pub const EDIT_PROMPT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Name given to the project created when no project list is stored.
pub const DEFAULT_PROJECT_NAME: &str = "New Project";
