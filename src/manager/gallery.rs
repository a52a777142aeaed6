//! Per-project gallery of kept generations.

use crate::constants::GALLERY_LIMIT;
use crate::id::IdGenerator;
use crate::manager::error::ManagerError;
use crate::model::{ProjectId, QualityMetadata, RecordKey, UserRating};
use crate::store::{Blob, BlobStore, GalleryEntry};

/// Most-recent-first gallery keys of the active project.
#[derive(Debug)]
pub struct GalleryManager {
    project_id: Option<ProjectId>,
    keys: Vec<RecordKey>,
    limit: usize,
}

impl Default for GalleryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryManager {
    pub fn new() -> Self {
        Self::with_limit(GALLERY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            project_id: None,
            keys: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn keys(&self) -> &[RecordKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Make `project_id`'s gallery the current view, newest first.
    pub fn load(&mut self, store: &BlobStore, project_id: ProjectId) -> Result<&[RecordKey], ManagerError> {
        let mut keys = store.gallery_keys_for_project(project_id)?;
        keys.sort_unstable_by(|a, b| b.cmp(a));
        self.keys = keys;
        self.project_id = Some(project_id);
        log::debug!(
            "Loaded {} gallery images for project {}",
            self.keys.len(),
            project_id
        );
        Ok(&self.keys)
    }

    /// Store a generated image and prepend it.
    ///
    /// Entries pushed beyond the cap are deleted along with their metadata.
    pub fn add_item(
        &mut self,
        store: &BlobStore,
        ids: &mut IdGenerator,
        project_id: ProjectId,
        image: &Blob,
        metadata: Option<&QualityMetadata>,
        original_image: Option<&Blob>,
    ) -> Result<RecordKey, ManagerError> {
        let key = ids.next_id();
        store.put_gallery_entry(key, project_id, image, original_image)?;
        if let Some(metadata) = metadata {
            store.put_gallery_metadata(key, metadata)?;
        }

        if self.project_id != Some(project_id) {
            self.load(store, project_id)?;
        } else {
            self.keys.insert(0, key);
        }
        if self.keys.len() > self.limit {
            let evicted = self.keys.split_off(self.limit);
            for old in &evicted {
                store.delete_gallery_entry(*old)?;
                store.delete_gallery_metadata(*old)?;
            }
            log::debug!("Evicted {} gallery images", evicted.len());
        }
        Ok(key)
    }

    /// Delete the given entries and their metadata.
    pub fn delete_items(&mut self, store: &BlobStore, keys: &[RecordKey]) -> Result<usize, ManagerError> {
        let mut deleted = 0;
        for key in keys {
            if store.delete_gallery_entry(*key)? {
                deleted += 1;
            }
            store.delete_gallery_metadata(*key)?;
        }
        self.keys.retain(|k| !keys.contains(k));
        Ok(deleted)
    }

    /// Delete every gallery image and metadata record of a project.
    pub fn clear(&mut self, store: &BlobStore, project_id: ProjectId) -> Result<usize, ManagerError> {
        let deleted = store.clear_gallery_for_project(project_id)?;
        store.clear_gallery_metadata_for_project(project_id)?;
        if self.project_id == Some(project_id) {
            self.keys.clear();
        }
        log::info!("Cleared {} gallery images of project {}", deleted, project_id);
        Ok(deleted)
    }

    pub fn entry(&self, store: &BlobStore, key: RecordKey) -> Result<Option<GalleryEntry>, ManagerError> {
        Ok(store.get_gallery_entry(key)?)
    }

    pub fn metadata(&self, store: &BlobStore, key: RecordKey) -> Result<Option<QualityMetadata>, ManagerError> {
        Ok(store.get_gallery_metadata(key)?)
    }

    /// Record the user's rating and comment on an image's metadata.
    ///
    /// Returns the updated metadata, or `None` if the image has none.
    pub fn rate(
        &self,
        store: &BlobStore,
        key: RecordKey,
        rating: Option<UserRating>,
        comment: Option<String>,
    ) -> Result<Option<QualityMetadata>, ManagerError> {
        let Some(mut metadata) = store.get_gallery_metadata(key)? else {
            log::warn!("Cannot rate gallery image {}: no metadata", key);
            return Ok(None);
        };
        metadata.user_rating = rating;
        metadata.user_comment = comment;
        store.put_gallery_metadata(key, &metadata)?;
        Ok(Some(metadata))
    }
}
