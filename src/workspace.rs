//! The authoring session: one blob store, one settings storage and the
//! managers and editor state that operate on them.
//!
//! `Workspace` keeps the active project's settings, history and gallery
//! loaded and makes sure a pending edit prompt is saved before the active
//! project changes.

use thiserror::Error;
use web_time::Instant;

use crate::config::{AppConfig, LimitsConfig};
use crate::detection::{DetectionError, Detections, QualityEvaluation};
use crate::editor::EditorState;
use crate::format::{ExportArtifact, ExportError, ExportOptions, ExporterRegistry, export_filename};
use crate::id::IdGenerator;
use crate::manager::{GalleryManager, HistoryManager, ManagerError, NewHistoryItem, ProjectManager};
use crate::model::{
    BrushSettings, DetectType, HistoryItem, HistoryResult, Project, ProjectId, PromptState,
    QualityMetadata, RecordKey, RoiShape,
};
use crate::settings::{
    FileStorage, KeyValueStorage, ProjectSettings, PromptDebouncer, StorageError, load_brush,
    save_brush,
};
use crate::store::{Blob, BlobStore, ObjectUrl, ObjectUrlRegistry, ProjectDeletion, StoreError};
use crate::thumbnail::{ThumbnailError, ThumbnailOptions, image_dimensions, make_thumbnail};

/// Errors surfaced by workspace operations.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Thumbnail error: {0}")]
    Thumbnail(#[from] ThumbnailError),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    /// No data directory could be determined for an unset storage path
    #[error("No location configured for {0}")]
    NoLocation(&'static str),
}

pub struct Workspace {
    store: BlobStore,
    storage: Box<dyn KeyValueStorage>,
    ids: IdGenerator,
    projects: ProjectManager,
    history: HistoryManager,
    gallery: GalleryManager,
    settings: ProjectSettings,
    debouncer: PromptDebouncer,
    editor: EditorState,
    exporters: ExporterRegistry,
    thumbnails: ThumbnailOptions,
    urls: ObjectUrlRegistry,
}

impl Workspace {
    /// Open a workspace over an existing store and storage.
    pub fn open(
        store: BlobStore,
        mut storage: Box<dyn KeyValueStorage>,
        limits: &LimitsConfig,
    ) -> Result<Self, WorkspaceError> {
        let mut ids = IdGenerator::new();
        let projects = ProjectManager::load(storage.as_mut(), &mut ids)?;

        let mut editor = EditorState::new();
        editor.brush = load_brush(storage.as_ref());

        let mut workspace = Self {
            store,
            storage,
            ids,
            projects,
            history: HistoryManager::with_limit(limits.history_limit),
            gallery: GalleryManager::with_limit(limits.gallery_limit),
            settings: ProjectSettings::default(),
            debouncer: PromptDebouncer::new(),
            editor,
            exporters: ExporterRegistry::new(),
            thumbnails: ThumbnailOptions {
                max_side: limits.thumbnail_size,
                ..ThumbnailOptions::default()
            },
            urls: ObjectUrlRegistry::new(),
        };
        workspace.load_active()?;
        Ok(workspace)
    }

    /// Open the database and settings file named by `config`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_config(config: &AppConfig) -> Result<Self, WorkspaceError> {
        let db_path = config
            .database_path()
            .ok_or(WorkspaceError::NoLocation("the blob database"))?;
        let settings_path = config
            .settings_path()
            .ok_or(WorkspaceError::NoLocation("the settings file"))?;

        let store = BlobStore::open(db_path)?;
        let storage = FileStorage::open(settings_path);
        Self::open(store, Box::new(storage), &config.limits)
    }

    fn load_active(&mut self) -> Result<(), WorkspaceError> {
        let id = self.projects.active_id();
        self.settings = ProjectSettings::load(self.storage.as_ref(), id);
        self.history.load(self.storage.as_ref(), id);
        self.gallery.load(&self.store, id)?;
        self.editor.reset();
        Ok(())
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    pub fn storage(&self) -> &dyn KeyValueStorage {
        self.storage.as_ref()
    }

    pub fn projects(&self) -> &ProjectManager {
        &self.projects
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.projects.active()
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn gallery(&self) -> &GalleryManager {
        &self.gallery
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorState {
        &mut self.editor
    }

    /// Registry behind the URLs handed out by [`Self::gallery_image_url`]
    /// and [`Self::history_thumbnail_url`].
    pub fn object_urls(&self) -> &ObjectUrlRegistry {
        &self.urls
    }

    pub fn exporters(&self) -> &ExporterRegistry {
        &self.exporters
    }

    // --- projects ---

    pub fn create_project(&mut self, name: &str) -> Result<ProjectId, WorkspaceError> {
        self.debouncer.flush(self.storage.as_mut())?;
        let id = self
            .projects
            .create(self.storage.as_mut(), &mut self.ids, name)?
            .id;
        self.load_active()?;
        Ok(id)
    }

    pub fn rename_project(&mut self, id: ProjectId, name: &str) -> Result<(), WorkspaceError> {
        self.projects.rename(self.storage.as_mut(), id, name)?;
        Ok(())
    }

    /// Make `id` the active project. A pending edit prompt is saved to the
    /// project it was typed in first.
    pub fn switch_project(&mut self, id: ProjectId) -> Result<(), WorkspaceError> {
        self.debouncer.flush(self.storage.as_mut())?;
        self.projects.switch_to(self.storage.as_mut(), id)?;
        self.load_active()
    }

    pub fn delete_project(&mut self, id: ProjectId) -> Result<ProjectDeletion, WorkspaceError> {
        let was_active = self.projects.active_id() == id;
        if was_active {
            self.debouncer.cancel();
        } else {
            self.debouncer.flush(self.storage.as_mut())?;
        }

        let deleted = self
            .projects
            .delete(&mut self.store, self.storage.as_mut(), id)?;
        if was_active {
            self.load_active()?;
        }
        Ok(deleted)
    }

    // --- settings ---

    /// Change the active project's settings and save them.
    pub fn update_settings(
        &mut self,
        update: impl FnOnce(&mut ProjectSettings),
    ) -> Result<(), WorkspaceError> {
        update(&mut self.settings);
        self.settings
            .save(self.storage.as_mut(), self.projects.active_id())?;
        Ok(())
    }

    /// Record an edit prompt change. It is saved once it has been stable
    /// for the debounce delay; see [`Workspace::tick`].
    pub fn set_edit_prompt(&mut self, prompt: impl Into<String>, now: Instant) {
        let prompt = prompt.into();
        self.debouncer
            .changed(self.projects.active_id(), prompt.clone(), now);
        self.settings.edit_prompt = prompt;
    }

    /// Save the edit prompt if its debounce delay has passed.
    pub fn tick(&mut self, now: Instant) -> Result<bool, WorkspaceError> {
        Ok(self.debouncer.save_if_due(self.storage.as_mut(), now)?)
    }

    /// Save anything still pending.
    pub fn flush(&mut self) -> Result<(), WorkspaceError> {
        self.debouncer.flush(self.storage.as_mut())?;
        Ok(())
    }

    pub fn set_brush(&mut self, brush: BrushSettings) -> Result<(), WorkspaceError> {
        self.editor.brush = brush;
        save_brush(self.storage.as_mut(), &brush)?;
        Ok(())
    }

    // --- history ---

    /// Store a run on `image` in the active project's history.
    ///
    /// Thumbnails are generated for the image and, when given, for the
    /// result image.
    pub fn record_run(
        &mut self,
        image: Blob,
        detect_type: DetectType,
        result: Option<HistoryResult>,
        result_image: Option<&Blob>,
    ) -> Result<HistoryItem, WorkspaceError> {
        let (width, height) = image_dimensions(&image)?;
        let thumbnail = make_thumbnail(&image, self.thumbnails)?;
        let result_thumbnail = result_image
            .map(|blob| make_thumbnail(blob, self.thumbnails))
            .transpose()?;
        let prompt_state = PromptState {
            edit_prompt: Some(self.settings.edit_prompt.clone()).filter(|p| !p.is_empty()),
        };

        let item = self.history.add_item(
            &self.store,
            self.storage.as_mut(),
            &mut self.ids,
            NewHistoryItem {
                project_id: self.projects.active_id(),
                image,
                image_width: f64::from(width),
                image_height: f64::from(height),
                detect_type,
                prompt_state,
                thumbnail,
                result_thumbnail,
                result,
                is_curated: false,
            },
        )?;
        log::debug!("Recorded {} run {}", detect_type.as_str(), item.id);
        Ok(item)
    }

    /// Decode a detection model's response and record it against `image`.
    pub fn record_detection(
        &mut self,
        image: Blob,
        detect_type: DetectType,
        response: &str,
    ) -> Result<HistoryItem, WorkspaceError> {
        let detections = Detections::parse(detect_type, response)?;
        log::info!(
            "Model returned {} {} detections",
            detections.len(),
            detect_type.as_str()
        );
        let result = detections.into_history_result()?;
        self.record_run(image, detect_type, Some(result), None)
    }

    /// Flag the newest run of `detect_type` as part of the dataset.
    pub fn curate_latest(
        &mut self,
        detect_type: DetectType,
    ) -> Result<Option<RecordKey>, WorkspaceError> {
        Ok(self
            .history
            .curate_latest(self.storage.as_mut(), detect_type)?)
    }

    pub fn clear_history(&mut self) -> Result<usize, WorkspaceError> {
        let id = self.projects.active_id();
        Ok(self.history.clear(&self.store, self.storage.as_mut(), id)?)
    }

    // --- gallery ---

    /// Store a generated image in the active project's gallery together
    /// with its quality evaluation and the ROIs it was generated from.
    pub fn add_generated(
        &mut self,
        image: &Blob,
        evaluation: Option<&QualityEvaluation>,
        rois: Vec<RoiShape>,
        original: Option<&Blob>,
    ) -> Result<RecordKey, WorkspaceError> {
        let project_id = self.projects.active_id();
        let metadata = evaluation.map(|e| {
            QualityMetadata::new(project_id, e.score, e.feedback.clone()).with_rois(rois)
        });
        Ok(self.gallery.add_item(
            &self.store,
            &mut self.ids,
            project_id,
            image,
            metadata.as_ref(),
            original,
        )?)
    }

    /// Reopen a gallery image's ROIs in the editor. Returns false if it has no metadata.
    pub fn reopen_rois(&mut self, key: RecordKey) -> Result<bool, WorkspaceError> {
        let Some(metadata) = self.gallery.metadata(&self.store, key)? else {
            return Ok(false);
        };
        self.editor.load_rois(metadata.rois);
        Ok(true)
    }

    pub fn delete_generated(&mut self, keys: &[RecordKey]) -> Result<usize, WorkspaceError> {
        Ok(self.gallery.delete_items(&self.store, keys)?)
    }

    pub fn clear_gallery(&mut self) -> Result<usize, WorkspaceError> {
        let id = self.projects.active_id();
        Ok(self.gallery.clear(&self.store, id)?)
    }

    // --- display ---

    /// URL for a gallery image, live until the handle is dropped.
    pub fn gallery_image_url(&self, key: RecordKey) -> Result<Option<ObjectUrl>, WorkspaceError> {
        Ok(self
            .store
            .get_gallery_image(key)?
            .map(|blob| self.urls.create(blob)))
    }

    /// URL for a history record's thumbnail, or its result thumbnail when
    /// `result` is set and one exists.
    pub fn history_thumbnail_url(
        &self,
        item: &HistoryItem,
        result: bool,
    ) -> Result<Option<ObjectUrl>, WorkspaceError> {
        let key = match item.result_thumbnail {
            Some(key) if result => key,
            _ => item.thumbnail,
        };
        Ok(self
            .store
            .get_history_image(key)?
            .map(|blob| self.urls.create(blob)))
    }

    // --- export ---

    /// Export the active project's curated 2D boxes with the exporter `format_id`.
    pub fn export(
        &self,
        format_id: &str,
        options: &ExportOptions,
    ) -> Result<ExportArtifact, WorkspaceError> {
        self.export_project(self.projects.active_id(), format_id, options)
    }

    /// Export any project's curated 2D boxes without making it active.
    ///
    /// The artifact is named after the project.
    pub fn export_project(
        &self,
        project_id: ProjectId,
        format_id: &str,
        options: &ExportOptions,
    ) -> Result<ExportArtifact, WorkspaceError> {
        let project = self
            .projects
            .get(project_id)
            .ok_or_else(|| ManagerError::project_not_found(project_id))?;
        let exporter = self.exporters.require(format_id)?;
        let history = HistoryManager::read_list(self.storage.as_ref(), project_id);

        let artifact = exporter.export(&history, &self.store, options)?;
        Ok(artifact.with_filename(export_filename(Some(project.name.as_str()), exporter)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    use super::*;
    use crate::model::{BoundingBox2D, UserRating};
    use crate::settings::{ImageSize, MemoryStorage, keys};

    fn workspace() -> Workspace {
        Workspace::open(
            BlobStore::open_in_memory().unwrap(),
            Box::new(MemoryStorage::new()),
            &LimitsConfig::default(),
        )
        .unwrap()
    }

    fn png(width: u32, height: u32) -> Blob {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 120, 200]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        Blob::png(out.into_inner())
    }

    const BOXES: &str = "```json\n[{\"box_2d\": [100, 200, 300, 600], \"label\": \"car\"}]\n```";

    #[test]
    fn test_display_urls_release_on_drop() {
        let mut ws = workspace();
        let item = ws
            .record_run(png(64, 32), DetectType::BoundingBoxes2D, None, Some(&png(32, 32)))
            .unwrap();
        let key = ws.add_generated(&png(8, 8), None, Vec::new(), None).unwrap();

        let thumb = ws.history_thumbnail_url(&item, false).unwrap().unwrap();
        let result = ws.history_thumbnail_url(&item, true).unwrap().unwrap();
        let mut gallery = ws.gallery_image_url(key).unwrap().unwrap();
        assert_eq!(ws.object_urls().len(), 3);
        assert_ne!(thumb.as_str(), result.as_str());
        assert_eq!(
            ws.object_urls().resolve(gallery.as_str()),
            ws.store().get_gallery_image(key).unwrap()
        );
        assert_eq!(image_dimensions(&result.blob().unwrap()).unwrap(), (32, 32));

        gallery.revoke();
        assert_eq!(ws.object_urls().len(), 2);
        drop(thumb);
        drop(result);
        assert!(ws.object_urls().is_empty());
        assert!(ws.gallery_image_url(key + 1000).unwrap().is_none());
    }

    #[test]
    fn test_first_open_has_default_project() {
        let ws = workspace();
        assert!(ws.projects().created_default());
        assert!(ws.history().is_empty());
        assert!(ws.gallery().is_empty());
    }

    #[test]
    fn test_record_detection_stores_thumbnail_and_boxes() {
        let mut ws = workspace();
        let item = ws
            .record_detection(png(640, 320), DetectType::BoundingBoxes2D, BOXES)
            .unwrap();

        assert_eq!((item.image_width, item.image_height), (640.0, 320.0));
        assert_eq!(ws.history().items()[0], item);

        let thumb = ws.store().get_history_image(item.thumbnail).unwrap().unwrap();
        assert_eq!(image_dimensions(&thumb).unwrap(), (128, 64));

        let result = ws.store().get_history_result(item.id).unwrap().unwrap();
        assert_eq!(
            result.as_boxes().unwrap(),
            &[BoundingBox2D::new("car", 0.2, 0.1, 0.4, 0.2)]
        );
    }

    #[test]
    fn test_export_uses_project_name() {
        let mut ws = workspace();
        ws.create_project("Street  Cars").unwrap();

        let err = ws.export("coco", &ExportOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::Export(ExportError::NothingToExport)
        ));

        ws.record_detection(png(100, 100), DetectType::BoundingBoxes2D, BOXES)
            .unwrap();
        ws.curate_latest(DetectType::BoundingBoxes2D).unwrap();

        let artifact = ws.export("yolo", &ExportOptions::default()).unwrap();
        assert_eq!(artifact.filename, "Street_Cars.yolo.zip");
        assert_eq!(artifact.annotations_exported, 1);

        assert!(matches!(
            ws.export("voc", &ExportOptions::default()),
            Err(WorkspaceError::Export(ExportError::UnknownFormat { .. }))
        ));
    }

    #[test]
    fn test_export_inactive_project() {
        let mut ws = workspace();
        let first = ws.projects().active_id();
        ws.record_detection(png(100, 100), DetectType::BoundingBoxes2D, BOXES)
            .unwrap();
        ws.curate_latest(DetectType::BoundingBoxes2D).unwrap();
        ws.create_project("Empty").unwrap();

        let artifact = ws
            .export_project(first, "coco", &ExportOptions::default())
            .unwrap();
        assert_eq!(artifact.filename, "New_Project.coco.json");
        assert_ne!(ws.projects().active_id(), first);

        assert!(matches!(
            ws.export_project(1, "coco", &ExportOptions::default()),
            Err(WorkspaceError::Manager(ManagerError::ProjectNotFound { id: 1 }))
        ));
    }

    #[test]
    fn test_switch_flushes_edit_prompt_to_its_project() {
        let mut ws = workspace();
        let first = ws.projects().active_id();
        let start = Instant::now();

        ws.set_edit_prompt("make it red", start);
        assert!(!ws.tick(start + Duration::from_millis(100)).unwrap());

        let second = ws.create_project("Second").unwrap();
        assert_eq!(
            ws.storage()
                .get_item(&keys::project_scoped(keys::EDIT_PROMPT, first))
                .as_deref(),
            Some("make it red")
        );
        assert_eq!(ws.settings().edit_prompt, "");

        ws.set_edit_prompt("blue", start);
        assert!(ws.tick(start + Duration::from_millis(600)).unwrap());

        ws.switch_project(first).unwrap();
        assert_eq!(ws.settings().edit_prompt, "make it red");
        ws.switch_project(second).unwrap();
        assert_eq!(ws.settings().edit_prompt, "blue");
    }

    #[test]
    fn test_settings_are_per_project() {
        let mut ws = workspace();
        let first = ws.projects().active_id();
        ws.update_settings(|s| s.image_size = ImageSize::FourK).unwrap();

        ws.create_project("Other").unwrap();
        assert_eq!(ws.settings().image_size, ImageSize::OneK);

        ws.switch_project(first).unwrap();
        assert_eq!(ws.settings().image_size, ImageSize::FourK);
    }

    #[test]
    fn test_delete_active_project_reloads_next() {
        let mut ws = workspace();
        let first = ws.projects().active_id();
        let second = ws.create_project("Doomed").unwrap();
        ws.record_run(png(10, 10), DetectType::Points, None, None)
            .unwrap();
        ws.add_generated(&png(10, 10), None, Vec::new(), None).unwrap();

        let deleted = ws.delete_project(second).unwrap();
        assert_eq!(deleted.total(), 3);
        assert_eq!(ws.projects().active_id(), first);
        assert!(ws.history().is_empty());
        assert!(ws.gallery().is_empty());
        assert!(ws.storage().get_item(&keys::history(second)).is_none());
    }

    #[test]
    fn test_gallery_rois_reopen_in_editor() {
        let mut ws = workspace();
        let evaluation = QualityEvaluation::parse(r#"{"score": 0}"#).unwrap();
        let rois = vec![RoiShape::Rectangle {
            id: crate::model::ShapeId(7),
            x: 0.1,
            y: 0.1,
            width: 0.5,
            height: 0.5,
        }];
        let key = ws
            .add_generated(&png(20, 20), Some(&evaluation), rois, None)
            .unwrap();

        let metadata = ws
            .gallery()
            .rate(ws.store(), key, Some(UserRating::Up), None)
            .unwrap()
            .unwrap();
        assert_eq!(metadata.quality_score, 88.0);

        assert!(ws.reopen_rois(key).unwrap());
        assert_eq!(ws.editor().rois.shapes().len(), 1);
    }

    #[test]
    fn test_brush_persists() {
        let mut ws = workspace();
        let mut brush = ws.editor().brush;
        brush.size = 12;
        ws.set_brush(brush).unwrap();
        assert_eq!(load_brush(ws.storage()).size, 12);
    }
}
