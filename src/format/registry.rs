//! Registry for discovering dataset exporters.

use std::collections::HashMap;

use crate::format::error::ExportError;
use crate::format::formats::{CocoFormat, YoloFormat};
use crate::format::traits::DatasetExporter;

/// Registry of available dataset exporters.
///
/// All built-in exporters are registered on creation.
pub struct ExporterRegistry {
    exporters: HashMap<&'static str, Box<dyn DatasetExporter>>,
}

impl ExporterRegistry {
    /// Create a new registry with all built-in exporters registered.
    pub fn new() -> Self {
        let mut registry = Self {
            exporters: HashMap::new(),
        };

        registry.register(Box::new(CocoFormat));
        registry.register(Box::new(YoloFormat));

        registry
    }

    /// Register an exporter implementation.
    pub fn register(&mut self, exporter: Box<dyn DatasetExporter>) {
        self.exporters.insert(exporter.id(), exporter);
    }

    /// Get an exporter by its ID.
    pub fn get(&self, id: &str) -> Option<&dyn DatasetExporter> {
        self.exporters.get(id).map(|f| f.as_ref())
    }

    /// Like [`get`](Self::get), failing with [`ExportError::UnknownFormat`].
    pub fn require(&self, id: &str) -> Result<&dyn DatasetExporter, ExportError> {
        self.get(id).ok_or_else(|| ExportError::unknown_format(id))
    }

    /// Get all registered exporters, sorted by ID.
    pub fn all(&self) -> Vec<&dyn DatasetExporter> {
        let mut all: Vec<_> = self.exporters.values().map(|f| f.as_ref()).collect();
        all.sort_by_key(|f| f.id());
        all
    }

    /// Get all exporter IDs, sorted.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.exporters.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for ExporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_exporters() {
        let registry = ExporterRegistry::new();

        assert_eq!(registry.ids(), vec!["coco", "yolo"]);
        assert_eq!(registry.get("coco").unwrap().suffix(), ".coco.json");
        assert_eq!(registry.get("yolo").unwrap().mime_type(), "application/zip");
        assert!(registry.get("voc").is_none());
    }

    #[test]
    fn test_require_unknown() {
        let registry = ExporterRegistry::new();
        assert!(matches!(
            registry.require("voc"),
            Err(ExportError::UnknownFormat { .. })
        ));
    }
}
