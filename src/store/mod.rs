//! Persistent storage for generated images, metadata and history results.

mod blob;
mod db;
mod error;
mod object_url;
pub mod schema;

pub use blob::Blob;
pub use db::{BlobStore, GalleryEntry, ProjectDeletion};
pub use error::StoreError;
pub use object_url::{ObjectUrl, ObjectUrlRegistry};
