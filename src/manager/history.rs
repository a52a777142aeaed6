//! Per-project generation/detection history.
//!
//! The record list lives in key-value storage under `history-{projectId}`,
//! most recent first. Images, thumbnails and results live in the blob store
//! under the keys each record names.

use crate::constants::HISTORY_LIMIT;
use crate::id::IdGenerator;
use crate::manager::error::ManagerError;
use crate::model::{DetectType, HistoryItem, HistoryResult, ProjectId, PromptState, RecordKey};
use crate::settings::{KeyValueStorage, keys};
use crate::store::{Blob, BlobStore};

/// Everything needed to record one run.
#[derive(Debug, Clone)]
pub struct NewHistoryItem {
    pub project_id: ProjectId,
    pub image: Blob,
    pub image_width: f64,
    pub image_height: f64,
    pub detect_type: DetectType,
    pub prompt_state: PromptState,
    pub thumbnail: Blob,
    pub result_thumbnail: Option<Blob>,
    pub result: Option<HistoryResult>,
    pub is_curated: bool,
}

/// Bounded, most-recent-first view of one project's history.
#[derive(Debug)]
pub struct HistoryManager {
    project_id: Option<ProjectId>,
    items: Vec<HistoryItem>,
    limit: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            project_id: None,
            items: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Read a project's stored list. Missing or malformed lists are empty.
    pub fn read_list(storage: &dyn KeyValueStorage, project_id: ProjectId) -> Vec<HistoryItem> {
        let key = keys::history(project_id);
        let Some(json) = storage.get_item(&key) else {
            return Vec::new();
        };
        match serde_json::from_str(&json) {
            Ok(items) => items,
            Err(e) => {
                log::warn!("Ignoring malformed history list '{}': {}", key, e);
                Vec::new()
            }
        }
    }

    fn write_list(
        storage: &mut dyn KeyValueStorage,
        project_id: ProjectId,
        items: &[HistoryItem],
    ) -> Result<(), ManagerError> {
        let json = serde_json::to_string(items)?;
        storage.set_item(&keys::history(project_id), &json)?;
        Ok(())
    }

    /// Every blob-store key referenced by a project's stored list, results included.
    pub fn record_keys(storage: &dyn KeyValueStorage, project_id: ProjectId) -> Vec<RecordKey> {
        Self::read_list(storage, project_id)
            .iter()
            .flat_map(|item| {
                let mut keys = item.blob_keys();
                keys.push(item.id);
                keys
            })
            .collect()
    }

    /// Make `project_id`'s history the current view.
    pub fn load(&mut self, storage: &dyn KeyValueStorage, project_id: ProjectId) -> &[HistoryItem] {
        self.items = Self::read_list(storage, project_id);
        self.project_id = Some(project_id);
        log::debug!(
            "Loaded {} history records for project {}",
            self.items.len(),
            project_id
        );
        &self.items
    }

    /// Store a new run and prepend it, evicting the oldest records beyond the cap.
    ///
    /// The record takes a block of three ids: the image under `id`, the
    /// thumbnail under `id + 1` and the result thumbnail under `id + 2`. The
    /// result payload is stored under `id`.
    pub fn add_item(
        &mut self,
        store: &BlobStore,
        storage: &mut dyn KeyValueStorage,
        ids: &mut IdGenerator,
        new: NewHistoryItem,
    ) -> Result<HistoryItem, ManagerError> {
        let id = ids.next_block(3);
        let project_id = new.project_id;

        store.put_history_image(id, project_id, &new.image)?;
        store.put_history_image(id + 1, project_id, &new.thumbnail)?;
        let result_thumbnail = match &new.result_thumbnail {
            Some(blob) => {
                store.put_history_image(id + 2, project_id, blob)?;
                Some(id + 2)
            }
            None => None,
        };
        if let Some(result) = &new.result {
            store.put_history_result(id, project_id, result)?;
        }

        let item = HistoryItem {
            id,
            project_id,
            timestamp: id,
            image_src: id,
            image_width: new.image_width,
            image_height: new.image_height,
            detect_type: new.detect_type,
            prompt_state: new.prompt_state,
            thumbnail: id + 1,
            result_thumbnail,
            is_curated: new.is_curated,
        };

        let mut items = Self::read_list(storage, project_id);
        items.insert(0, item.clone());
        let evicted = if items.len() > self.limit {
            items.split_off(self.limit)
        } else {
            Vec::new()
        };
        for old in &evicted {
            Self::delete_record(store, old)?;
        }
        Self::write_list(storage, project_id, &items)?;

        if !evicted.is_empty() {
            log::debug!(
                "Evicted {} history records from project {}",
                evicted.len(),
                project_id
            );
        }
        self.items = items;
        self.project_id = Some(project_id);
        Ok(item)
    }

    fn delete_record(store: &BlobStore, item: &HistoryItem) -> Result<(), ManagerError> {
        for key in item.blob_keys() {
            store.delete_history_image(key)?;
        }
        store.delete_history_result(item.id)?;
        Ok(())
    }

    /// Delete a project's whole history, stored blobs included.
    pub fn clear(
        &mut self,
        store: &BlobStore,
        storage: &mut dyn KeyValueStorage,
        project_id: ProjectId,
    ) -> Result<usize, ManagerError> {
        let items = Self::read_list(storage, project_id);
        for item in &items {
            Self::delete_record(store, item)?;
        }
        storage.remove_item(&keys::history(project_id))?;
        if self.project_id == Some(project_id) {
            self.items.clear();
        }
        log::info!(
            "Cleared {} history records of project {}",
            items.len(),
            project_id
        );
        Ok(items.len())
    }

    /// Mark the most recent record of `detect_type` as curated.
    ///
    /// Returns the record's id, or `None` when there is no such record.
    /// Curation is never undone.
    pub fn curate_latest(
        &mut self,
        storage: &mut dyn KeyValueStorage,
        detect_type: DetectType,
    ) -> Result<Option<RecordKey>, ManagerError> {
        let Some(project_id) = self.project_id else {
            return Ok(None);
        };
        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.detect_type == detect_type)
        else {
            return Ok(None);
        };
        let id = item.id;
        if !item.is_curated {
            item.is_curated = true;
            Self::write_list(storage, project_id, &self.items)?;
            log::debug!("Curated history record {}", id);
        }
        Ok(Some(id))
    }

    /// Curated 2D box records, most recent first.
    pub fn curated_2d(&self) -> Vec<&HistoryItem> {
        self.items.iter().filter(|item| item.is_curated_2d()).collect()
    }

    pub fn has_curated_2d(&self) -> bool {
        self.items.iter().any(HistoryItem::is_curated_2d)
    }
}
