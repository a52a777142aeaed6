//! Trait definitions for dataset exporters.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::format::error::ExportError;
use crate::model::{HistoryItem, HistoryResult, RecordKey};
use crate::store::{Blob, StoreError};

/// Read access to the stored results and images an export needs.
pub trait ExportSource {
    /// Detection result stored under a history record's id.
    fn history_result(&self, key: RecordKey) -> Result<Option<HistoryResult>, StoreError>;

    /// History image stored under `key`.
    fn history_image(&self, key: RecordKey) -> Result<Option<Blob>, StoreError>;
}

/// A dataset format that curated history can be exported to.
///
/// Exporters receive the whole history list of a project and select the
/// curated 2D box records themselves, so every format applies the same rule.
pub trait DatasetExporter: Send + Sync {
    /// Unique identifier for this format (e.g., "coco", "yolo").
    fn id(&self) -> &'static str;

    /// Human-readable name for UI display.
    fn display_name(&self) -> &'static str;

    /// Filename suffix, appended to the project name (e.g., ".coco.json").
    fn suffix(&self) -> &'static str;

    /// MIME type of the produced file.
    fn mime_type(&self) -> &'static str;

    /// Build the export file in memory.
    fn export(
        &self,
        history: &[HistoryItem],
        source: &dyn ExportSource,
        options: &ExportOptions,
    ) -> Result<ExportArtifact, ExportError>;
}

/// Options for export operations.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Timestamp recorded as the dataset creation date.
    pub created_at: DateTime<Utc>,

    /// Dataset description (COCO `info.description`).
    pub description: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            description: "Dataset exported from vdat".to_string(),
        }
    }
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the creation timestamp.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the dataset description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A finished export file.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    /// Suggested file name.
    pub filename: String,

    pub mime_type: &'static str,

    pub bytes: Vec<u8>,

    /// Number of distinct images in the dataset.
    pub images_exported: usize,

    /// Number of boxes written.
    pub annotations_exported: usize,

    /// Problems found while exporting (e.g., records without results).
    pub warnings: Vec<FormatWarning>,
}

impl ExportArtifact {
    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Set the file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Write the artifact into `dir` under its file name.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        log::info!("Wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Warning generated during export.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatWarning {
    /// History record this warning relates to (if applicable).
    pub record: Option<RecordKey>,

    /// Human-readable warning message.
    pub message: String,

    /// Severity level of the warning.
    pub severity: WarningSeverity,
}

impl FormatWarning {
    /// Create a new warning.
    pub fn new(message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            record: None,
            message: message.into(),
            severity,
        }
    }

    /// Create an info-level warning.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Info)
    }

    /// Create a warning-level warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Warning)
    }

    /// Set the history record this warning relates to.
    pub fn with_record(mut self, record: RecordKey) -> Self {
        self.record = Some(record);
        self
    }
}

/// Severity level for export warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    /// Informational message, not a problem.
    Info,
    /// Something was skipped.
    Warning,
}

/// File name for an export of `project_name`: whitespace runs become `_`.
pub fn export_filename(project_name: Option<&str>, exporter: &dyn DatasetExporter) -> String {
    let base = match project_name {
        Some(name) => {
            let mut base = String::with_capacity(name.len());
            let mut in_space = false;
            for c in name.chars() {
                if c.is_whitespace() {
                    if !in_space {
                        base.push('_');
                    }
                    in_space = true;
                } else {
                    base.push(c);
                    in_space = false;
                }
            }
            base
        }
        None => "export".to_string(),
    };
    format!("{}{}", base, exporter.suffix())
}
