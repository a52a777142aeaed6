//! History records and their stored results.

use serde::{Deserialize, Serialize};

use crate::model::project::ProjectId;

/// Key of a record in the blob store.
pub type RecordKey = u64;

/// Task that produced a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectType {
    #[serde(rename = "Synthetic Generation")]
    SyntheticGeneration,
    #[serde(rename = "2D bounding boxes")]
    BoundingBoxes2D,
    #[serde(rename = "Segmentation masks")]
    SegmentationMasks,
    #[serde(rename = "Points")]
    Points,
    #[serde(rename = "3D bounding boxes")]
    BoundingBoxes3D,
}

impl DetectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectType::SyntheticGeneration => "Synthetic Generation",
            DetectType::BoundingBoxes2D => "2D bounding boxes",
            DetectType::SegmentationMasks => "Segmentation masks",
            DetectType::Points => "Points",
            DetectType::BoundingBoxes3D => "3D bounding boxes",
        }
    }
}

/// Prompt inputs captured with a history record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_prompt: Option<String>,
}

/// One generation or detection run.
///
/// `image_src`, `thumbnail` and `result_thumbnail` are blob-store keys. New
/// records use `id`, `id + 1` and `id + 2` for them, and the detection result
/// is stored under `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: RecordKey,
    pub project_id: ProjectId,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub image_src: RecordKey,
    pub image_width: f64,
    pub image_height: f64,
    pub detect_type: DetectType,
    #[serde(default)]
    pub prompt_state: PromptState,
    pub thumbnail: RecordKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_thumbnail: Option<RecordKey>,
    #[serde(default)]
    pub is_curated: bool,
}

impl HistoryItem {
    /// Every blob-store key owned by this record (image, thumbnails).
    pub fn blob_keys(&self) -> Vec<RecordKey> {
        let mut keys = vec![self.image_src, self.thumbnail];
        keys.extend(self.result_thumbnail);
        keys
    }

    /// Whether this record belongs in an exported dataset.
    pub fn is_curated_2d(&self) -> bool {
        self.is_curated && self.detect_type == DetectType::BoundingBoxes2D
    }
}

/// A labelled 2D box in normalized image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundingBox2D {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox2D {
    pub fn new(label: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            width,
            height,
        }
    }
}

/// Stored outcome of a history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryResult {
    /// 2D detection boxes.
    Boxes(Vec<BoundingBox2D>),
    /// Reference to a generated image (data URL or blob key).
    ImageRef(String),
    /// Masks, points or 3D boxes, kept verbatim.
    Other(serde_json::Value),
}

impl HistoryResult {
    /// The box list, if this result is one.
    pub fn as_boxes(&self) -> Option<&[BoundingBox2D]> {
        match self {
            HistoryResult::Boxes(boxes) => Some(boxes),
            HistoryResult::ImageRef(_) | HistoryResult::Other(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_item_layout() {
        let json = r#"{
            "id": 1000, "projectId": 7, "timestamp": 1000, "imageSrc": 1000,
            "imageWidth": 640, "imageHeight": 480,
            "detectType": "2D bounding boxes",
            "promptState": {"editPrompt": "a cat"},
            "thumbnail": 1001, "resultThumbnail": 1002, "isCurated": true
        }"#;
        let item: HistoryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.detect_type, DetectType::BoundingBoxes2D);
        assert_eq!(item.prompt_state.edit_prompt.as_deref(), Some("a cat"));
        assert_eq!(item.blob_keys(), vec![1000, 1001, 1002]);
        assert!(item.is_curated_2d());

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["detectType"], "2D bounding boxes");
        assert_eq!(back["imageSrc"], 1000);
    }

    #[test]
    fn test_is_curated_defaults_to_false() {
        let json = r#"{"id":1,"projectId":1,"timestamp":1,"imageSrc":1,
            "imageWidth":1,"imageHeight":1,"detectType":"Points",
            "promptState":{},"thumbnail":2}"#;
        let item: HistoryItem = serde_json::from_str(json).unwrap();
        assert!(!item.is_curated);
        assert_eq!(item.result_thumbnail, None);
        assert_eq!(item.blob_keys(), vec![1, 2]);
    }

    #[test]
    fn test_result_variants() {
        let boxes: HistoryResult =
            serde_json::from_str(r#"[{"label":"cat","x":0.1,"y":0.1,"width":0.2,"height":0.2}]"#)
                .unwrap();
        assert_eq!(boxes.as_boxes().map(<[BoundingBox2D]>::len), Some(1));

        let image: HistoryResult = serde_json::from_str(r#""data:image/png;base64,AAAA""#).unwrap();
        assert!(matches!(image, HistoryResult::ImageRef(_)));
        assert!(image.as_boxes().is_none());

        let points: HistoryResult =
            serde_json::from_str(r#"[{"label":"eye","point":{"x":0.5,"y":0.5}}]"#).unwrap();
        assert!(matches!(points, HistoryResult::Other(_)));
    }
}
