//! SQLite-backed blob and metadata store.
//!
//! Four collections, each keyed by a caller-supplied integer key:
//! gallery images, gallery quality metadata, history images and history
//! results. Writes overwrite unconditionally; reads of missing keys return
//! `None`.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{HistoryResult, ProjectId, QualityMetadata, RecordKey};
use crate::store::blob::Blob;
use crate::store::error::StoreError;
use crate::store::schema;

/// A stored gallery image.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryEntry {
    /// Owning project. Rows written before projects existed may have none.
    pub project_id: Option<ProjectId>,
    pub image: Blob,
    /// Source image the generated one was derived from.
    pub original_image: Option<Blob>,
}

/// Row counts removed by [`BlobStore::delete_project`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectDeletion {
    pub gallery: usize,
    pub gallery_metadata: usize,
    pub history_images: usize,
    pub history_results: usize,
}

impl ProjectDeletion {
    pub fn total(&self) -> usize {
        self.gallery + self.gallery_metadata + self.history_images + self.history_results
    }
}

/// Persistent store for images, metadata and history results.
pub struct BlobStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore").field("path", &self.path).finish()
    }
}

impl BlobStore {
    /// Open (or create) the store at `path` and migrate it to the current schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Opened blob store at {:?}", path);
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(mut conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        schema::migrate(&mut conn)?;
        Ok(Self { conn, path })
    }

    /// Location of the database file, if it is not in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema_version(&self) -> Result<i64, StoreError> {
        schema::version(&self.conn)
    }

    // ========================================================================
    // Gallery
    // ========================================================================

    pub fn put_gallery_entry(
        &self,
        key: RecordKey,
        project_id: ProjectId,
        image: &Blob,
        original_image: Option<&Blob>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO gallery (key, project_id, image, image_mime, original_image, original_mime)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(key) DO UPDATE SET
                project_id = excluded.project_id,
                image = excluded.image,
                image_mime = excluded.image_mime,
                original_image = excluded.original_image,
                original_mime = excluded.original_mime
            "#,
            params![
                key,
                project_id,
                image.bytes,
                image.mime_type,
                original_image.map(|b| &b.bytes),
                original_image.map(|b| &b.mime_type),
            ],
        )?;
        log::debug!("Stored gallery image {} ({} bytes)", key, image.len());
        Ok(())
    }

    pub fn get_gallery_entry(&self, key: RecordKey) -> Result<Option<GalleryEntry>, StoreError> {
        let entry = self
            .conn
            .query_row(
                "SELECT project_id, image, image_mime, original_image, original_mime
                 FROM gallery WHERE key = ?1",
                params![key],
                gallery_entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    pub fn get_gallery_image(&self, key: RecordKey) -> Result<Option<Blob>, StoreError> {
        Ok(self.get_gallery_entry(key)?.map(|entry| entry.image))
    }

    pub fn delete_gallery_entry(&self, key: RecordKey) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM gallery WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }

    /// All gallery entries of a project in ascending key order.
    pub fn gallery_entries_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<(RecordKey, GalleryEntry)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT project_id, image, image_mime, original_image, original_mime, key
             FROM gallery WHERE project_id = ?1 ORDER BY key",
        )?;
        let entries = stmt
            .query_map(params![project_id], |row| {
                Ok((row.get::<_, RecordKey>(5)?, gallery_entry_from_row(row)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Keys of a project's gallery entries, without loading the images.
    pub fn gallery_keys_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<RecordKey>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM gallery WHERE project_id = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![project_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    pub fn clear_gallery_for_project(&self, project_id: ProjectId) -> Result<usize, StoreError> {
        Ok(self
            .conn
            .execute("DELETE FROM gallery WHERE project_id = ?1", params![project_id])?)
    }

    // ========================================================================
    // Gallery metadata
    // ========================================================================

    pub fn put_gallery_metadata(
        &self,
        key: RecordKey,
        metadata: &QualityMetadata,
    ) -> Result<(), StoreError> {
        let record = serde_json::to_string(metadata)?;
        self.conn.execute(
            r#"
            INSERT INTO gallery_metadata (key, project_id, record) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                project_id = excluded.project_id,
                record = excluded.record
            "#,
            params![key, metadata.project_id, record],
        )?;
        Ok(())
    }

    /// Metadata for `key`. A record that no longer parses is treated as absent.
    pub fn get_gallery_metadata(
        &self,
        key: RecordKey,
    ) -> Result<Option<QualityMetadata>, StoreError> {
        let record: Option<String> = self
            .conn
            .query_row(
                "SELECT record FROM gallery_metadata WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(record.and_then(|json| parse_record(key, "gallery metadata", &json)))
    }

    pub fn delete_gallery_metadata(&self, key: RecordKey) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM gallery_metadata WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }

    pub fn gallery_metadata_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<(RecordKey, QualityMetadata)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT key, record FROM gallery_metadata WHERE project_id = ?1 ORDER BY key",
        )?;
        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok((row.get::<_, RecordKey>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(key, json)| {
                parse_record(key, "gallery metadata", &json).map(|meta| (key, meta))
            })
            .collect())
    }

    pub fn clear_gallery_metadata_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<usize, StoreError> {
        Ok(self.conn.execute(
            "DELETE FROM gallery_metadata WHERE project_id = ?1",
            params![project_id],
        )?)
    }

    // ========================================================================
    // History images
    // ========================================================================

    pub fn put_history_image(
        &self,
        key: RecordKey,
        project_id: ProjectId,
        image: &Blob,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO history_images (key, project_id, data, mime) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                project_id = excluded.project_id,
                data = excluded.data,
                mime = excluded.mime
            "#,
            params![key, project_id, image.bytes, image.mime_type],
        )?;
        log::trace!("Stored history image {} ({} bytes)", key, image.len());
        Ok(())
    }

    pub fn get_history_image(&self, key: RecordKey) -> Result<Option<Blob>, StoreError> {
        let blob = self
            .conn
            .query_row(
                "SELECT mime, data FROM history_images WHERE key = ?1",
                params![key],
                |row| Ok(Blob::new(row.get::<_, String>(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(blob)
    }

    pub fn delete_history_image(&self, key: RecordKey) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM history_images WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }

    // ========================================================================
    // History results
    // ========================================================================

    pub fn put_history_result(
        &self,
        key: RecordKey,
        project_id: ProjectId,
        result: &HistoryResult,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(result)?;
        self.conn.execute(
            r#"
            INSERT INTO history_results (key, project_id, payload) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                project_id = excluded.project_id,
                payload = excluded.payload
            "#,
            params![key, project_id, payload],
        )?;
        Ok(())
    }

    pub fn get_history_result(&self, key: RecordKey) -> Result<Option<HistoryResult>, StoreError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM history_results WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload.and_then(|json| parse_record(key, "history result", &json)))
    }

    pub fn delete_history_result(&self, key: RecordKey) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM history_results WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }

    /// Every stored history result across all projects, in key order.
    pub fn all_history_results(&self) -> Result<Vec<(RecordKey, HistoryResult)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, payload FROM history_results ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, RecordKey>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(key, json)| {
                parse_record(key, "history result", &json).map(|result| (key, result))
            })
            .collect())
    }

    // ========================================================================
    // Projects
    // ========================================================================

    /// Remove every record owned by `project_id` from all four collections.
    pub fn delete_project(&mut self, project_id: ProjectId) -> Result<ProjectDeletion, StoreError> {
        self.delete_project_with_keys(project_id, &[])
    }

    /// Like [`delete_project`](Self::delete_project), also removing history
    /// rows listed in `history_keys`. History rows written before they were
    /// tagged with a project are only reachable through their keys.
    pub fn delete_project_with_keys(
        &mut self,
        project_id: ProjectId,
        history_keys: &[RecordKey],
    ) -> Result<ProjectDeletion, StoreError> {
        let tx = self.conn.transaction()?;
        let mut deleted = ProjectDeletion {
            gallery: tx.execute("DELETE FROM gallery WHERE project_id = ?1", params![project_id])?,
            gallery_metadata: tx.execute(
                "DELETE FROM gallery_metadata WHERE project_id = ?1",
                params![project_id],
            )?,
            history_images: tx.execute(
                "DELETE FROM history_images WHERE project_id = ?1",
                params![project_id],
            )?,
            history_results: tx.execute(
                "DELETE FROM history_results WHERE project_id = ?1",
                params![project_id],
            )?,
        };

        for key in history_keys {
            deleted.history_images +=
                tx.execute("DELETE FROM history_images WHERE key = ?1", params![key])?;
            deleted.history_results +=
                tx.execute("DELETE FROM history_results WHERE key = ?1", params![key])?;
        }
        tx.commit()?;

        log::info!(
            "Deleted project {}: {} records removed",
            project_id,
            deleted.total()
        );
        Ok(deleted)
    }
}

fn gallery_entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GalleryEntry> {
    let original_bytes: Option<Vec<u8>> = row.get(3)?;
    let original_mime: Option<String> = row.get(4)?;
    Ok(GalleryEntry {
        project_id: row.get(0)?,
        image: Blob::new(row.get::<_, String>(2)?, row.get(1)?),
        original_image: original_bytes.map(|bytes| {
            Blob::new(
                original_mime.unwrap_or_else(|| "application/octet-stream".to_string()),
                bytes,
            )
        }),
    })
}

fn parse_record<T: serde::de::DeserializeOwned>(key: RecordKey, what: &str, json: &str) -> Option<T> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring malformed {} {}: {}", what, key, e);
            None
        }
    }
}
