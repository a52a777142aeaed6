//! Dataset export system.
//!
//! Curated 2D box detections from a project's history are exported to
//! dataset formats through the `DatasetExporter` trait. Exporters build the
//! whole file in memory and return it as an `ExportArtifact`.
//!
//! ## Supported Formats
//!
//! - **COCO JSON**: boxes in pixel space, one JSON file
//! - **YOLO**: normalized boxes, images and labels packed in a zip
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vdat::format::{ExporterRegistry, ExportOptions};
//!
//! let registry = ExporterRegistry::new();
//! let coco = registry.get("coco").unwrap();
//! let artifact = coco.export(history.items(), &store, &ExportOptions::default())?;
//! artifact.write_to_dir(Path::new("out"))?;
//! ```

mod dataset;
mod error;
pub mod formats;
mod registry;
mod traits;

pub use dataset::{CuratedDataset, CuratedRecord, FirstSeen};
pub use error::ExportError;
pub use registry::ExporterRegistry;
pub use traits::{
    DatasetExporter, ExportArtifact, ExportOptions, ExportSource, FormatWarning, WarningSeverity,
    export_filename,
};
