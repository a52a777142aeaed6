//! Project list and active project.

use crate::constants::DEFAULT_PROJECT_NAME;
use crate::id::IdGenerator;
use crate::manager::error::ManagerError;
use crate::manager::history::HistoryManager;
use crate::model::{Project, ProjectId};
use crate::settings::{KeyValueStorage, ProjectSettings, keys};
use crate::store::{BlobStore, ProjectDeletion};

/// Known projects, in creation order, plus the active one.
#[derive(Debug, Clone)]
pub struct ProjectManager {
    projects: Vec<Project>,
    active: ProjectId,
    created_default: bool,
}

impl ProjectManager {
    /// Load the project list. A missing, malformed or empty list is replaced
    /// by a single default project.
    pub fn load(storage: &mut dyn KeyValueStorage, ids: &mut IdGenerator) -> Result<Self, ManagerError> {
        let stored: Vec<Project> = match storage.get_item(keys::PROJECTS) {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed project list: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        if stored.is_empty() {
            let project = Project::new(ids.next_id(), DEFAULT_PROJECT_NAME);
            log::info!("Created default project {}", project.id);
            let manager = Self {
                active: project.id,
                projects: vec![project],
                created_default: true,
            };
            manager.save(storage)?;
            return Ok(manager);
        }

        let active = storage
            .get_item(keys::ACTIVE_PROJECT_ID)
            .and_then(|v| v.trim().parse::<ProjectId>().ok())
            .filter(|id| stored.iter().any(|p| p.id == *id))
            .unwrap_or(stored[0].id);

        // Resume ids after existing projects so new ones sort after them.
        let max = stored.iter().map(|p| p.id).max().unwrap_or(0);
        if max > ids.last() {
            *ids = IdGenerator::starting_after(max);
        }

        Ok(Self {
            projects: stored,
            active,
            created_default: false,
        })
    }

    fn save(&self, storage: &mut dyn KeyValueStorage) -> Result<(), ManagerError> {
        storage.set_item(keys::PROJECTS, &serde_json::to_string(&self.projects)?)?;
        storage.set_item(keys::ACTIVE_PROJECT_ID, &self.active.to_string())?;
        Ok(())
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn active_id(&self) -> ProjectId {
        self.active
    }

    pub fn active(&self) -> Option<&Project> {
        self.get(self.active)
    }

    /// Whether `load` had to create the default project (first run).
    pub fn created_default(&self) -> bool {
        self.created_default
    }

    /// Create a project and make it active.
    pub fn create(
        &mut self,
        storage: &mut dyn KeyValueStorage,
        ids: &mut IdGenerator,
        name: &str,
    ) -> Result<&Project, ManagerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ManagerError::EmptyProjectName);
        }
        let project = Project::new(ids.next_id(), name);
        self.active = project.id;
        self.projects.push(project);
        self.save(storage)?;
        log::info!("Created project '{}' ({})", name, self.active);
        Ok(&self.projects[self.projects.len() - 1])
    }

    pub fn rename(
        &mut self,
        storage: &mut dyn KeyValueStorage,
        id: ProjectId,
        name: &str,
    ) -> Result<(), ManagerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ManagerError::EmptyProjectName);
        }
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ManagerError::project_not_found(id))?;
        project.name = name.to_string();
        self.save(storage)
    }

    pub fn switch_to(&mut self, storage: &mut dyn KeyValueStorage, id: ProjectId) -> Result<(), ManagerError> {
        if self.get(id).is_none() {
            return Err(ManagerError::project_not_found(id));
        }
        self.active = id;
        self.save(storage)?;
        log::debug!("Switched to project {}", id);
        Ok(())
    }

    /// Delete a project and everything it owns.
    ///
    /// Removes its blob-store records, its history list and its scoped
    /// settings. The last remaining project cannot be deleted. If the
    /// deleted project was active, the first remaining one becomes active.
    pub fn delete(
        &mut self,
        store: &mut BlobStore,
        storage: &mut dyn KeyValueStorage,
        id: ProjectId,
    ) -> Result<ProjectDeletion, ManagerError> {
        if self.get(id).is_none() {
            return Err(ManagerError::project_not_found(id));
        }
        if self.projects.len() <= 1 {
            return Err(ManagerError::LastProject);
        }

        let history_keys = HistoryManager::record_keys(storage, id);
        let deleted = store.delete_project_with_keys(id, &history_keys)?;
        ProjectSettings::remove_all(storage, id)?;

        self.projects.retain(|p| p.id != id);
        if self.active == id {
            self.active = self.projects[0].id;
        }
        self.save(storage)?;
        Ok(deleted)
    }
}
