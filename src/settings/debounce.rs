//! Debounced persistence of the edit prompt.
//!
//! The prompt changes on every keystroke; it is written to storage only once
//! it has stayed unchanged for the debounce delay.

use std::time::Duration;
use web_time::Instant;

use crate::constants::EDIT_PROMPT_DEBOUNCE;
use crate::model::ProjectId;
use crate::settings::project::ProjectSettings;
use crate::settings::storage::{KeyValueStorage, StorageError};

#[derive(Debug, Clone, PartialEq)]
struct PendingPrompt {
    project_id: ProjectId,
    prompt: String,
    changed_at: Instant,
}

/// Holds the latest unsaved prompt until it is due.
#[derive(Debug)]
pub struct PromptDebouncer {
    delay: Duration,
    pending: Option<PendingPrompt>,
}

impl Default for PromptDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptDebouncer {
    pub fn new() -> Self {
        Self {
            delay: EDIT_PROMPT_DEBOUNCE,
            pending: None,
        }
    }

    /// Set the debounce delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Record a prompt change. Restarts the delay.
    pub fn changed(&mut self, project_id: ProjectId, prompt: impl Into<String>, now: Instant) {
        self.pending = Some(PendingPrompt {
            project_id,
            prompt: prompt.into(),
            changed_at: now,
        });
        log::trace!("Edit prompt changed for project {}", project_id);
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the pending prompt has been stable for the full delay.
    pub fn is_due(&self, now: Instant) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| now.duration_since(p.changed_at) >= self.delay)
    }

    /// Write the pending prompt if it is due. Returns true if something was written.
    pub fn save_if_due(
        &mut self,
        storage: &mut dyn KeyValueStorage,
        now: Instant,
    ) -> Result<bool, StorageError> {
        if !self.is_due(now) {
            return Ok(false);
        }
        self.flush(storage)
    }

    /// Write the pending prompt immediately (e.g. before switching projects).
    pub fn flush(&mut self, storage: &mut dyn KeyValueStorage) -> Result<bool, StorageError> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };
        if let Err(e) =
            ProjectSettings::save_edit_prompt(storage, pending.project_id, &pending.prompt)
        {
            // Keep it so a later attempt can retry.
            self.pending = Some(pending);
            return Err(e);
        }
        log::debug!("Saved edit prompt for project {}", pending.project_id);
        Ok(true)
    }

    /// Drop the pending prompt without saving it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
