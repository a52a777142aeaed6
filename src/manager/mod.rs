//! History, gallery and project management on top of the stores.

mod error;
mod gallery;
mod history;
mod projects;

pub use error::ManagerError;
pub use gallery::GalleryManager;
pub use history::{HistoryManager, NewHistoryItem};
pub use projects::ProjectManager;
