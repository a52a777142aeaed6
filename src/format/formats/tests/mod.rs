//! Scenario tests for dataset exporters.
//!
//! These tests run the exporters against an in-memory blob store seeded
//! with curated history records.

mod yolo_tests;

use crate::model::{
    BoundingBox2D, DetectType, HistoryItem, HistoryResult, PromptState, RecordKey,
};
use crate::store::{Blob, BlobStore};

/// A curated 2D box history record on a 640x480 image.
pub(super) fn curated(id: RecordKey, image_src: RecordKey) -> HistoryItem {
    HistoryItem {
        id,
        project_id: 1,
        timestamp: 1_700_000_000_000,
        image_src,
        image_width: 640.0,
        image_height: 480.0,
        detect_type: DetectType::BoundingBoxes2D,
        prompt_state: PromptState::default(),
        thumbnail: id + 1,
        result_thumbnail: None,
        is_curated: true,
    }
}

pub(super) fn cat() -> BoundingBox2D {
    BoundingBox2D::new("cat", 0.1, 0.1, 0.2, 0.2)
}

pub(super) fn dog() -> BoundingBox2D {
    BoundingBox2D::new("dog", 0.5, 0.25, 0.5, 0.5)
}

/// Store `boxes` as the result of `item` and a JPEG under its image key.
pub(super) fn seed(store: &BlobStore, item: &HistoryItem, boxes: Vec<BoundingBox2D>) {
    store
        .put_history_result(item.id, item.project_id, &HistoryResult::Boxes(boxes))
        .unwrap();
    store
        .put_history_image(item.image_src, item.project_id, &Blob::jpeg(vec![0xFF, 0xD8, 0xFF]))
        .unwrap();
}
