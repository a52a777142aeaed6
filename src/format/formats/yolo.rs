//! YOLO zip export.
//!
//! The archive holds `images/img_{i}.jpg`, `labels/img_{i}.txt` and a
//! `data.yaml`. Label lines stay in normalized space:
//! `{class} {x_center} {y_center} {width} {height}`.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::format::dataset::{CuratedDataset, FirstSeen};
use crate::format::error::ExportError;
use crate::format::traits::{
    DatasetExporter, ExportArtifact, ExportOptions, ExportSource, FormatWarning,
};
use crate::model::{BoundingBox2D, HistoryItem, RecordKey};

/// YOLO format, packed as a zip archive.
///
/// Supports:
/// - Bounding boxes only (normalized center/size)
/// - Class names in data.yaml, numbered from 0 in first-seen order
pub struct YoloFormat;

impl DatasetExporter for YoloFormat {
    fn id(&self) -> &'static str {
        "yolo"
    }

    fn display_name(&self) -> &'static str {
        "YOLO (ZIP)"
    }

    fn suffix(&self) -> &'static str {
        ".yolo.zip"
    }

    fn mime_type(&self) -> &'static str {
        "application/zip"
    }

    fn export(
        &self,
        history: &[HistoryItem],
        source: &dyn ExportSource,
        _options: &ExportOptions,
    ) -> Result<ExportArtifact, ExportError> {
        log::info!("Exporting YOLO dataset");

        let mut dataset = CuratedDataset::collect(history, source)?;

        // First pass: class ids over every box.
        let mut categories: FirstSeen<String> = FirstSeen::new();
        for (_, boxes) in dataset.with_boxes() {
            for bbox in boxes {
                categories.insert(&bbox.label);
            }
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let file_options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        zip.add_directory("images/", file_options)?;
        zip.add_directory("labels/", file_options)?;

        // Second pass: images and label lines. Records sharing an image
        // append to the same label file.
        let mut images: FirstSeen<RecordKey> = FirstSeen::new();
        let mut labels: Vec<String> = Vec::new();
        let mut annotations_exported = 0;
        let mut missing_images = Vec::new();

        for (item, boxes) in dataset.with_boxes() {
            let (image_idx, is_new) = images.insert(&item.image_src);
            if is_new {
                labels.push(String::new());
                match source.history_image(item.image_src)? {
                    Some(blob) => {
                        zip.start_file(format!("images/img_{}.jpg", image_idx), file_options)?;
                        zip.write_all(&blob.bytes)?;
                    }
                    None => missing_images.push((item.id, item.image_src)),
                }
            }

            let lines: Vec<String> = boxes
                .iter()
                .filter_map(|bbox| {
                    categories
                        .get(&bbox.label)
                        .map(|class_id| label_line(class_id, bbox))
                })
                .collect();
            annotations_exported += lines.len();
            let content = lines.join("\n");

            let label = &mut labels[image_idx];
            if !label.is_empty() {
                label.push('\n');
            }
            label.push_str(&content);
        }

        for (idx, content) in labels.iter().enumerate() {
            zip.start_file(format!("labels/img_{}.txt", idx), file_options)?;
            zip.write_all(content.as_bytes())?;
        }

        zip.start_file("data.yaml", file_options)?;
        zip.write_all(data_yaml(categories.values()).as_bytes())?;

        let bytes = zip.finish()?.into_inner();

        for (record, image) in missing_images {
            dataset.warnings.push(
                FormatWarning::warning(format!(
                    "Image {} of record {} not found, archive has labels only",
                    image, record
                ))
                .with_record(record),
            );
        }

        log::info!(
            "Exported {} images with {} annotations ({} warnings)",
            images.len(),
            annotations_exported,
            dataset.warnings.len()
        );

        Ok(ExportArtifact {
            filename: format!("export{}", self.suffix()),
            mime_type: self.mime_type(),
            bytes,
            images_exported: images.len(),
            annotations_exported,
            warnings: dataset.warnings,
        })
    }
}

/// One label line for a normalized box.
pub(crate) fn label_line(class_id: usize, bbox: &BoundingBox2D) -> String {
    let x_center = bbox.x + bbox.width / 2.0;
    let y_center = bbox.y + bbox.height / 2.0;
    format!(
        "{} {} {} {} {}",
        class_id, x_center, y_center, bbox.width, bbox.height
    )
}

/// `data.yaml` listing class names as single-quoted YAML scalars.
pub(crate) fn data_yaml(names: &[String]) -> String {
    let quoted = names
        .iter()
        .map(|name| format!("'{}'", name.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "train: ../images\nval: ../images\n\nnc: {}\nnames: [{}]",
        names.len(),
        quoted
    )
}
