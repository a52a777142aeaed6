//! Tests for the YOLO zip exporter.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use super::{cat, curated, dog, seed};
use crate::format::formats::YoloFormat;
use crate::format::formats::yolo::data_yaml;
use crate::format::traits::{DatasetExporter, ExportArtifact, ExportOptions};
use crate::model::HistoryItem;
use crate::store::BlobStore;

fn export(history: &[HistoryItem], store: &BlobStore) -> ExportArtifact {
    YoloFormat
        .export(history, store, &ExportOptions::default())
        .unwrap()
}

fn read_entry(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    Some(content)
}

fn read_bytes(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    Some(content)
}

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect()
}

#[test]
fn test_yolo_exporter_metadata() {
    let format = YoloFormat;

    assert_eq!(format.id(), "yolo");
    assert_eq!(format.suffix(), ".yolo.zip");
}

#[test]
fn test_yolo_label_line_is_normalized_center() {
    let store = BlobStore::open_in_memory().unwrap();
    let item = curated(100, 100);
    seed(&store, &item, vec![cat()]);

    let artifact = export(&[item], &store);

    assert_eq!(
        read_entry(&artifact.bytes, "labels/img_0.txt").as_deref(),
        Some("0 0.2 0.2 0.2 0.2")
    );
    assert_eq!(
        read_bytes(&artifact.bytes, "images/img_0.jpg"),
        Some(vec![0xFF, 0xD8, 0xFF])
    );
    assert_eq!(
        read_entry(&artifact.bytes, "data.yaml").as_deref(),
        Some("train: ../images\nval: ../images\n\nnc: 1\nnames: ['cat']")
    );
    assert_eq!(artifact.images_exported, 1);
    assert_eq!(artifact.annotations_exported, 1);
}

#[test]
fn test_yolo_shared_image_appends_labels() {
    let store = BlobStore::open_in_memory().unwrap();
    let first = curated(100, 100);
    let second = curated(200, 100);
    seed(&store, &first, vec![cat()]);
    seed(&store, &second, vec![dog()]);

    let artifact = export(&[first, second], &store);

    assert_eq!(
        read_entry(&artifact.bytes, "labels/img_0.txt").as_deref(),
        Some("0 0.2 0.2 0.2 0.2\n1 0.75 0.5 0.5 0.5")
    );
    assert!(read_entry(&artifact.bytes, "labels/img_1.txt").is_none());
    assert_eq!(artifact.images_exported, 1);
}

#[test]
fn test_yolo_categories_span_all_records() {
    let store = BlobStore::open_in_memory().unwrap();
    let first = curated(100, 100);
    let second = curated(200, 200);
    seed(&store, &first, vec![dog()]);
    seed(&store, &second, vec![cat(), dog()]);

    let artifact = export(&[first, second], &store);

    assert_eq!(
        read_entry(&artifact.bytes, "labels/img_1.txt").as_deref(),
        Some("1 0.2 0.2 0.2 0.2\n0 0.75 0.5 0.5 0.5")
    );
    assert!(
        read_entry(&artifact.bytes, "data.yaml")
            .unwrap()
            .ends_with("nc: 2\nnames: ['dog', 'cat']")
    );
}

#[test]
fn test_yolo_skips_records_without_boxes() {
    let store = BlobStore::open_in_memory().unwrap();
    let missing = curated(100, 100);
    let present = curated(200, 200);
    seed(&store, &present, vec![cat()]);

    let artifact = export(&[missing, present], &store);

    // The record with boxes gets index 0.
    assert!(read_entry(&artifact.bytes, "labels/img_0.txt").is_some());
    assert!(read_entry(&artifact.bytes, "labels/img_1.txt").is_none());
    assert_eq!(artifact.images_exported, 1);
    assert_eq!(artifact.warnings.len(), 1);
}

#[test]
fn test_yolo_missing_image_blob_still_writes_labels() {
    let store = BlobStore::open_in_memory().unwrap();
    let item = curated(100, 200);
    seed(&store, &item, vec![cat()]);
    store.delete_history_image(200).unwrap();

    let artifact = export(&[item], &store);

    let names = entry_names(&artifact.bytes);
    assert!(names.iter().any(|n| n == "labels/img_0.txt"));
    assert!(!names.iter().any(|n| n == "images/img_0.jpg"));
    assert_eq!(artifact.warnings.len(), 1);
    // Warnings point at the history record, not the image blob.
    assert_eq!(artifact.warnings[0].record, Some(100));
    assert!(artifact.warnings[0].message.contains("200"));
}

#[test]
fn test_yolo_data_yaml_quotes_apostrophes() {
    let yaml = data_yaml(&["driver's seat".to_string(), "cat".to_string()]);

    let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    let names: Vec<&str> = parsed["names"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|name| name.as_str().unwrap())
        .collect();
    assert_eq!(names, ["driver's seat", "cat"]);
    assert_eq!(parsed["nc"].as_u64(), Some(2));
}

#[test]
fn test_yolo_label_with_apostrophe_exports_parseable_yaml() {
    let store = BlobStore::open_in_memory().unwrap();
    let item = curated(100, 100);
    let mut label = cat();
    label.label = "driver's seat".to_string();
    seed(&store, &item, vec![label]);

    let artifact = export(&[item], &store);

    let yaml = read_entry(&artifact.bytes, "data.yaml").unwrap();
    let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed["names"][0].as_str(), Some("driver's seat"));
}
