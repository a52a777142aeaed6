//! COCO JSON export.
//!
//! Boxes are written in pixel space: the normalized box is scaled by the
//! record's image size.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::format::dataset::{CuratedDataset, FirstSeen};
use crate::format::error::ExportError;
use crate::format::traits::{DatasetExporter, ExportArtifact, ExportOptions, ExportSource};
use crate::model::{HistoryItem, RecordKey};

/// COCO JSON format.
///
/// Supports:
/// - Bounding boxes (bbox, area)
/// - Categories, numbered from 1 in first-seen order
///
/// Does not support:
/// - Segmentation (always empty)
/// - Licenses (always empty)
pub struct CocoFormat;

impl DatasetExporter for CocoFormat {
    fn id(&self) -> &'static str {
        "coco"
    }

    fn display_name(&self) -> &'static str {
        "COCO (JSON)"
    }

    fn suffix(&self) -> &'static str {
        ".coco.json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn export(
        &self,
        history: &[HistoryItem],
        source: &dyn ExportSource,
        options: &ExportOptions,
    ) -> Result<ExportArtifact, ExportError> {
        log::info!("Exporting COCO dataset");

        let dataset = CuratedDataset::collect(history, source)?;
        let coco = build_dataset(&dataset, options);
        let json = serde_json::to_string_pretty(&coco)?;

        log::info!(
            "Exported {} images with {} annotations ({} warnings)",
            coco.images.len(),
            coco.annotations.len(),
            dataset.warnings.len()
        );

        Ok(ExportArtifact {
            filename: format!("export{}", self.suffix()),
            mime_type: self.mime_type(),
            bytes: json.into_bytes(),
            images_exported: coco.images.len(),
            annotations_exported: coco.annotations.len(),
            warnings: dataset.warnings,
        })
    }
}

fn build_dataset(dataset: &CuratedDataset<'_>, options: &ExportOptions) -> CocoDataset {
    let mut coco = CocoDataset {
        info: CocoInfo {
            description: options.description.clone(),
            year: options.created_at.year(),
            version: "1.0".to_string(),
            date_created: iso_millis(options.created_at),
        },
        licenses: Vec::new(),
        images: Vec::new(),
        annotations: Vec::new(),
        categories: Vec::new(),
    };
    let mut images: FirstSeen<RecordKey> = FirstSeen::new();
    let mut categories: FirstSeen<String> = FirstSeen::new();

    for record in &dataset.records {
        let item = record.item;
        let (image_idx, is_new) = images.insert(&item.image_src);
        let image_id = image_idx as u64 + 1;
        if is_new {
            coco.images.push(CocoImage {
                id: image_id,
                width: item.image_width,
                height: item.image_height,
                file_name: format!("image_{}.jpg", item.id),
                license: None,
                date_captured: DateTime::from_timestamp_millis(item.timestamp as i64)
                    .map(iso_millis)
                    .unwrap_or_default(),
            });
        }

        let Some(boxes) = &record.boxes else {
            continue;
        };
        for bbox in boxes {
            let (cat_idx, is_new) = categories.insert(&bbox.label);
            let category_id = cat_idx as u64 + 1;
            if is_new {
                coco.categories.push(CocoCategory {
                    id: category_id,
                    name: bbox.label.clone(),
                    supercategory: "object".to_string(),
                });
            }

            let abs_x = bbox.x * item.image_width;
            let abs_y = bbox.y * item.image_height;
            let abs_width = bbox.width * item.image_width;
            let abs_height = bbox.height * item.image_height;

            coco.annotations.push(CocoAnnotation {
                id: coco.annotations.len() as u64 + 1,
                image_id,
                category_id,
                bbox: [abs_x, abs_y, abs_width, abs_height],
                area: abs_width * abs_height,
                iscrowd: 0,
                segmentation: Vec::new(),
            });
        }
    }
    coco
}

/// ISO-8601 with milliseconds, UTC (`2024-01-02T03:04:05.000Z`).
fn iso_millis(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize whole numbers without a fractional part, like JSON written by
/// JavaScript (`640` rather than `640.0`).
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn serialize_numbers<S: Serializer>(values: &[f64; 4], serializer: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(Some(values.len()))?;
    for value in values {
        seq.serialize_element(&Number(*value))?;
    }
    seq.end()
}

struct Number(f64);

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_number(&self.0, serializer)
    }
}

// COCO format structures

#[derive(Debug, Serialize)]
struct CocoDataset {
    info: CocoInfo,
    licenses: Vec<serde_json::Value>,
    images: Vec<CocoImage>,
    annotations: Vec<CocoAnnotation>,
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Serialize)]
struct CocoInfo {
    description: String,
    year: i32,
    version: String,
    date_created: String,
}

#[derive(Debug, Serialize)]
struct CocoImage {
    id: u64,
    #[serde(serialize_with = "serialize_number")]
    width: f64,
    #[serde(serialize_with = "serialize_number")]
    height: f64,
    file_name: String,
    license: Option<u32>,
    date_captured: String,
}

#[derive(Debug, Serialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u64,
    #[serde(serialize_with = "serialize_numbers")]
    bbox: [f64; 4],
    #[serde(serialize_with = "serialize_number")]
    area: f64,
    iscrowd: u8,
    segmentation: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct CocoCategory {
    id: u64,
    name: String,
    supercategory: String,
}
