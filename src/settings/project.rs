//! Persisted generation settings and editor preferences.
//!
//! Values are stored as plain strings (numbers and booleans in their
//! textual form). A value that does not parse leaves the default in place.

use crate::model::{BrushSettings, BrushShape, ProjectId};
use crate::settings::keys;
use crate::settings::storage::{KeyValueStorage, StorageError};

/// Output resolution requested from the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    #[default]
    OneK,
    TwoK,
    FourK,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1K" => Some(ImageSize::OneK),
            "2K" => Some(ImageSize::TwoK),
            "4K" => Some(ImageSize::FourK),
            _ => None,
        }
    }
}

/// Camera framing hint added to generation prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraAngle {
    #[default]
    Default,
    Wide,
    TopDown,
    LowAngle,
    CloseUp,
    Cinematic,
}

impl CameraAngle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraAngle::Default => "default",
            CameraAngle::Wide => "wide",
            CameraAngle::TopDown => "top-down",
            CameraAngle::LowAngle => "low-angle",
            CameraAngle::CloseUp => "close-up",
            CameraAngle::Cinematic => "cinematic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(CameraAngle::Default),
            "wide" => Some(CameraAngle::Wide),
            "top-down" => Some(CameraAngle::TopDown),
            "low-angle" => Some(CameraAngle::LowAngle),
            "close-up" => Some(CameraAngle::CloseUp),
            "cinematic" => Some(CameraAngle::Cinematic),
            _ => None,
        }
    }
}

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }

    pub fn load(storage: &dyn KeyValueStorage) -> Self {
        storage
            .get_item(keys::THEME)
            .and_then(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    pub fn save(&self, storage: &mut dyn KeyValueStorage) -> Result<(), StorageError> {
        storage.set_item(keys::THEME, self.as_str())
    }
}

/// Default image model.
pub const DEFAULT_SYNTH_MODEL: &str = "gemini-2.5-flash-image";

/// Per-project generation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSettings {
    pub synth_model: String,
    pub image_size: ImageSize,
    pub batch_count: u32,
    pub is_chained_mode: bool,
    pub is_bg_replace_mode: bool,
    /// Minimum quality score (0-100) for a generated image to be kept.
    pub min_quality: u32,
    pub camera_angle: CameraAngle,
    pub edit_prompt: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            synth_model: DEFAULT_SYNTH_MODEL.to_string(),
            image_size: ImageSize::OneK,
            batch_count: 1,
            is_chained_mode: false,
            is_bg_replace_mode: false,
            min_quality: 0,
            camera_angle: CameraAngle::Default,
            edit_prompt: String::new(),
        }
    }
}

impl ProjectSettings {
    /// Load a project's settings, keeping defaults for missing or unparseable values.
    pub fn load(storage: &dyn KeyValueStorage, project_id: ProjectId) -> Self {
        let get = |base: &str| {
            storage
                .get_item(&keys::project_scoped(base, project_id))
                .filter(|v| !v.is_empty())
        };
        let mut settings = Self::default();

        if let Some(model) = get(keys::SYNTH_MODEL) {
            settings.synth_model = model;
        }
        if let Some(size) = get(keys::IMAGE_SIZE).and_then(|v| ImageSize::parse(&v)) {
            settings.image_size = size;
        }
        if let Some(prompt) = get(keys::EDIT_PROMPT) {
            settings.edit_prompt = prompt;
        }
        if let Some(count) = get(keys::BATCH_COUNT).and_then(|v| v.trim().parse().ok()) {
            settings.batch_count = count;
        }
        if let Some(chained) = get(keys::CHAINED_MODE) {
            settings.is_chained_mode = chained == "true";
        }
        if let Some(bg) = get(keys::BG_REPLACE_MODE) {
            settings.is_bg_replace_mode = bg == "true";
        }
        if let Some(min) = get(keys::MIN_QUALITY).and_then(|v| v.trim().parse().ok()) {
            settings.min_quality = min;
        }
        if let Some(angle) = get(keys::CAMERA_ANGLE).and_then(|v| CameraAngle::parse(&v)) {
            settings.camera_angle = angle;
        }
        settings
    }

    /// Save every setting except the edit prompt, which is written through
    /// the debouncer.
    pub fn save(
        &self,
        storage: &mut dyn KeyValueStorage,
        project_id: ProjectId,
    ) -> Result<(), StorageError> {
        let values = [
            (keys::SYNTH_MODEL, self.synth_model.clone()),
            (keys::IMAGE_SIZE, self.image_size.as_str().to_string()),
            (keys::BATCH_COUNT, self.batch_count.to_string()),
            (keys::CHAINED_MODE, self.is_chained_mode.to_string()),
            (keys::BG_REPLACE_MODE, self.is_bg_replace_mode.to_string()),
            (keys::MIN_QUALITY, self.min_quality.to_string()),
            (keys::CAMERA_ANGLE, self.camera_angle.as_str().to_string()),
        ];
        for (base, value) in values {
            storage.set_item(&keys::project_scoped(base, project_id), &value)?;
        }
        Ok(())
    }

    pub fn save_edit_prompt(
        storage: &mut dyn KeyValueStorage,
        project_id: ProjectId,
        prompt: &str,
    ) -> Result<(), StorageError> {
        storage.set_item(&keys::project_scoped(keys::EDIT_PROMPT, project_id), prompt)
    }

    /// Remove every project-scoped key of `project_id`, including its history list.
    pub fn remove_all(
        storage: &mut dyn KeyValueStorage,
        project_id: ProjectId,
    ) -> Result<(), StorageError> {
        for base in keys::PROJECT_SCOPED {
            storage.remove_item(&keys::project_scoped(base, project_id))?;
        }
        storage.remove_item(&keys::history(project_id))
    }
}

/// Global brush preferences.
pub fn load_brush(storage: &dyn KeyValueStorage) -> BrushSettings {
    let mut brush = BrushSettings::default();
    if let Some(size) = storage
        .get_item(keys::BRUSH_SIZE)
        .and_then(|v| v.trim().parse().ok())
    {
        brush.size = size;
    }
    if let Some(opacity) = storage
        .get_item(keys::BRUSH_OPACITY)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|o| o.is_finite())
    {
        brush.opacity = opacity;
    }
    if let Some(shape) = storage
        .get_item(keys::BRUSH_SHAPE)
        .and_then(|v| BrushShape::parse(&v))
    {
        brush.shape = shape;
    }
    brush
}

pub fn save_brush(
    storage: &mut dyn KeyValueStorage,
    brush: &BrushSettings,
) -> Result<(), StorageError> {
    storage.set_item(keys::BRUSH_SIZE, &brush.size.to_string())?;
    storage.set_item(keys::BRUSH_OPACITY, &brush.opacity.to_string())?;
    storage.set_item(keys::BRUSH_SHAPE, brush.shape.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::storage::MemoryStorage;

    #[test]
    fn test_round_trip() {
        let mut storage = MemoryStorage::new();
        let settings = ProjectSettings {
            synth_model: "imagen-4.0-generate-001".into(),
            image_size: ImageSize::FourK,
            batch_count: 4,
            is_chained_mode: true,
            is_bg_replace_mode: false,
            min_quality: 70,
            camera_angle: CameraAngle::TopDown,
            edit_prompt: String::new(),
        };
        settings.save(&mut storage, 9).unwrap();

        assert_eq!(storage.get_item("batchCount-9").as_deref(), Some("4"));
        assert_eq!(storage.get_item("isChainedMode-9").as_deref(), Some("true"));
        assert_eq!(storage.get_item("cameraAngle-9").as_deref(), Some("top-down"));
        assert_eq!(ProjectSettings::load(&storage, 9), settings);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let mut storage = MemoryStorage::new();
        storage.set_item("batchCount-1", "many").unwrap();
        storage.set_item("imageSize-1", "8K").unwrap();
        storage.set_item("cameraAngle-1", "sideways").unwrap();
        storage.set_item("minQuality-1", "55").unwrap();

        let settings = ProjectSettings::load(&storage, 1);
        assert_eq!(settings.batch_count, 1);
        assert_eq!(settings.image_size, ImageSize::OneK);
        assert_eq!(settings.camera_angle, CameraAngle::Default);
        assert_eq!(settings.min_quality, 55);
    }

    #[test]
    fn test_projects_are_isolated() {
        let mut storage = MemoryStorage::new();
        ProjectSettings::save_edit_prompt(&mut storage, 1, "a red car").unwrap();
        assert_eq!(ProjectSettings::load(&storage, 1).edit_prompt, "a red car");
        assert_eq!(ProjectSettings::load(&storage, 2).edit_prompt, "");
    }

    #[test]
    fn test_remove_all() {
        let mut storage = MemoryStorage::new();
        ProjectSettings::default().save(&mut storage, 1).unwrap();
        ProjectSettings::save_edit_prompt(&mut storage, 1, "x").unwrap();
        storage.set_item("history-1", "[]").unwrap();
        ProjectSettings::default().save(&mut storage, 2).unwrap();

        ProjectSettings::remove_all(&mut storage, 1).unwrap();
        assert!(storage.keys().iter().all(|k| k.ends_with("-2")));
    }

    #[test]
    fn test_brush_settings() {
        let mut storage = MemoryStorage::new();
        assert_eq!(load_brush(&storage), BrushSettings::default());

        storage.set_item(keys::BRUSH_SHAPE, "triangle").unwrap();
        storage.set_item(keys::BRUSH_SIZE, "-3").unwrap();
        assert_eq!(load_brush(&storage), BrushSettings::default());

        let brush = BrushSettings {
            size: 12,
            opacity: 0.25,
            shape: BrushShape::Square,
        };
        save_brush(&mut storage, &brush).unwrap();
        assert_eq!(load_brush(&storage), brush);
    }

    #[test]
    fn test_theme() {
        let mut storage = MemoryStorage::new();
        assert_eq!(Theme::load(&storage), Theme::System);
        Theme::Dark.save(&mut storage).unwrap();
        assert_eq!(Theme::load(&storage), Theme::Dark);
    }
}
