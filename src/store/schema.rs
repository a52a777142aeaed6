//! Versioned SQLite schema.
//!
//! The version lives in `PRAGMA user_version`. Migrations are additive and
//! keep existing rows; each one runs in its own transaction together with
//! the version bump.

use rusqlite::{Connection, Transaction};

use crate::store::error::StoreError;

/// Highest schema version this build can read and write.
pub const SCHEMA_VERSION: i64 = 5;

type Migration = fn(&Transaction<'_>) -> rusqlite::Result<()>;

const MIGRATIONS: [Migration; SCHEMA_VERSION as usize] = [
    create_base_tables,
    create_gallery_metadata,
    add_gallery_project_index,
    add_original_image,
    add_history_project_index,
];

/// Read the schema version of an open database.
pub fn version(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Bring the database up to [`SCHEMA_VERSION`].
pub fn migrate(conn: &mut Connection) -> Result<(), StoreError> {
    migrate_to(conn, SCHEMA_VERSION)
}

/// Apply migrations up to `target`.
///
/// A database already past `target` is left alone, unless it is past
/// [`SCHEMA_VERSION`], which is refused.
pub(crate) fn migrate_to(conn: &mut Connection, target: i64) -> Result<(), StoreError> {
    let current = version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(StoreError::SchemaTooNew {
            found: current,
            supported: SCHEMA_VERSION,
        });
    }

    for (index, migration) in MIGRATIONS.iter().enumerate() {
        let next = index as i64 + 1;
        if next <= current || next > target {
            continue;
        }
        let tx = conn.transaction()?;
        migration(&tx)?;
        tx.pragma_update(None, "user_version", next)?;
        tx.commit()?;
        log::info!("Migrated blob store schema to version {}", next);
    }
    Ok(())
}

fn create_base_tables(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS gallery (
            key INTEGER PRIMARY KEY,
            image BLOB NOT NULL,
            image_mime TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS history_images (
            key INTEGER PRIMARY KEY,
            data BLOB NOT NULL,
            mime TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS history_results (
            key INTEGER PRIMARY KEY,
            payload TEXT NOT NULL
        );
        "#,
    )
}

fn create_gallery_metadata(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS gallery_metadata (
            key INTEGER PRIMARY KEY,
            record TEXT NOT NULL
        );
        "#,
    )
}

/// Project scoping for the gallery. Existing rows take their project from
/// the stored metadata record.
fn add_gallery_project_index(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        r#"
        ALTER TABLE gallery ADD COLUMN project_id INTEGER;
        ALTER TABLE gallery_metadata ADD COLUMN project_id INTEGER;

        UPDATE gallery_metadata
            SET project_id = json_extract(record, '$.projectId')
            WHERE json_valid(record);
        UPDATE gallery
            SET project_id = (
                SELECT m.project_id FROM gallery_metadata m WHERE m.key = gallery.key
            );

        CREATE INDEX IF NOT EXISTS idx_gallery_project ON gallery(project_id);
        CREATE INDEX IF NOT EXISTS idx_gallery_metadata_project ON gallery_metadata(project_id);
        "#,
    )
}

fn add_original_image(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        r#"
        ALTER TABLE gallery ADD COLUMN original_image BLOB;
        ALTER TABLE gallery ADD COLUMN original_mime TEXT;
        "#,
    )
}

fn add_history_project_index(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        r#"
        ALTER TABLE history_images ADD COLUMN project_id INTEGER;
        ALTER TABLE history_results ADD COLUMN project_id INTEGER;

        CREATE INDEX IF NOT EXISTS idx_history_images_project ON history_images(project_id);
        CREATE INDEX IF NOT EXISTS idx_history_results_project ON history_results(project_id);
        "#,
    )
}
