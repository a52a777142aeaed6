//! Conversions between model responses and vdat's normalized geometry.
//!
//! Detection models answer in per-mille image coordinates with the row
//! first: `box_2d: [ymin, xmin, ymax, xmax]` and `point: [y, x]`, each in
//! 0..=1000. Everything stored by vdat uses `[0, 1]` fractions with x first.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::PER_MILLE;
use crate::geometry::Point;
use crate::model::{BoundingBox2D, DetectType, HistoryResult, RoiShape};
use crate::store::Blob;

/// Errors that can occur while decoding a model response.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Response is not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The detect type produces images, not detections
    #[error("Detect type '{0}' has no structured detections")]
    NotADetection(&'static str),
}

/// Remove a surrounding Markdown code fence (```` ```json ... ``` ````).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Per-mille `[ymin, xmin, ymax, xmax]` to a normalized box.
pub fn box_from_per_mille(label: impl Into<String>, box_2d: [f64; 4]) -> BoundingBox2D {
    let [ymin, xmin, ymax, xmax] = box_2d;
    BoundingBox2D::new(
        label,
        xmin / PER_MILLE,
        ymin / PER_MILLE,
        (xmax - xmin) / PER_MILLE,
        (ymax - ymin) / PER_MILLE,
    )
}

/// Normalized box back to per-mille `[ymin, xmin, ymax, xmax]`.
pub fn box_to_per_mille(bbox: &BoundingBox2D) -> [f64; 4] {
    [
        bbox.y * PER_MILLE,
        bbox.x * PER_MILLE,
        (bbox.y + bbox.height) * PER_MILLE,
        (bbox.x + bbox.width) * PER_MILLE,
    ]
}

/// Per-mille `[y, x]` to a normalized point.
pub fn point_from_per_mille(point: [f64; 2]) -> Point {
    let [y, x] = point;
    Point::new(x / PER_MILLE, y / PER_MILLE)
}

#[derive(Debug, Deserialize)]
struct RawBox2D {
    box_2d: [f64; 4],
    #[serde(default)]
    label: String,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    point: [f64; 2],
    #[serde(default)]
    label: String,
}

#[derive(Debug, Deserialize)]
struct RawMask {
    box_2d: [f64; 4],
    mask: String,
    #[serde(default)]
    label: String,
}

#[derive(Debug, Deserialize)]
struct RawBox3D {
    box_3d: [f64; 9],
    #[serde(default)]
    label: String,
}

/// A labelled point in normalized coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// A segmentation mask: its normalized box and the mask image as a data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationMask {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "imageData")]
    pub image_data: String,
}

/// A 3D box, kept in the model's camera-space convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Box3D {
    pub label: String,
    pub center: [f64; 3],
    pub size: [f64; 3],
    /// Roll, pitch and yaw in degrees.
    pub rpy: [f64; 3],
}

/// Decoded detections of one response.
#[derive(Debug, Clone, PartialEq)]
pub enum Detections {
    Boxes2D(Vec<BoundingBox2D>),
    Masks(Vec<SegmentationMask>),
    Points(Vec<LabeledPoint>),
    Boxes3D(Vec<Box3D>),
}

impl Detections {
    /// Decode a model response for `detect_type`. The JSON may be fenced.
    pub fn parse(detect_type: DetectType, response: &str) -> Result<Self, DetectionError> {
        let json = strip_code_fences(response);
        let detections = match detect_type {
            DetectType::SyntheticGeneration => {
                return Err(DetectionError::NotADetection(detect_type.as_str()));
            }
            DetectType::BoundingBoxes2D => {
                let raw: Vec<RawBox2D> = serde_json::from_str(json)?;
                Detections::Boxes2D(
                    raw.into_iter()
                        .map(|b| box_from_per_mille(b.label, b.box_2d))
                        .collect(),
                )
            }
            DetectType::SegmentationMasks => {
                let raw: Vec<RawMask> = serde_json::from_str(json)?;
                Detections::Masks(
                    raw.into_iter()
                        .map(|m| {
                            let bbox = box_from_per_mille(m.label, m.box_2d);
                            SegmentationMask {
                                label: bbox.label,
                                x: bbox.x,
                                y: bbox.y,
                                width: bbox.width,
                                height: bbox.height,
                                image_data: m.mask,
                            }
                        })
                        .collect(),
                )
            }
            DetectType::Points => {
                let raw: Vec<RawPoint> = serde_json::from_str(json)?;
                Detections::Points(
                    raw.into_iter()
                        .map(|p| {
                            let point = point_from_per_mille(p.point);
                            LabeledPoint {
                                label: p.label,
                                x: point.x,
                                y: point.y,
                            }
                        })
                        .collect(),
                )
            }
            DetectType::BoundingBoxes3D => {
                let raw: Vec<RawBox3D> = serde_json::from_str(json)?;
                Detections::Boxes3D(
                    raw.into_iter()
                        .map(|b| {
                            let [cx, cy, cz, w, h, d, roll, pitch, yaw] = b.box_3d;
                            Box3D {
                                label: b.label,
                                center: [cx, cy, cz],
                                size: [w, h, d],
                                rpy: [roll, pitch, yaw],
                            }
                        })
                        .collect(),
                )
            }
        };
        log::debug!("Decoded {} {} detections", detections.len(), detect_type.as_str());
        Ok(detections)
    }

    pub fn len(&self) -> usize {
        match self {
            Detections::Boxes2D(v) => v.len(),
            Detections::Masks(v) => v.len(),
            Detections::Points(v) => v.len(),
            Detections::Boxes3D(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The form stored in the history result collection.
    pub fn into_history_result(self) -> Result<HistoryResult, DetectionError> {
        Ok(match self {
            Detections::Boxes2D(boxes) => HistoryResult::Boxes(boxes),
            Detections::Masks(masks) => HistoryResult::Other(serde_json::to_value(masks)?),
            Detections::Points(points) => HistoryResult::Other(serde_json::to_value(points)?),
            Detections::Boxes3D(boxes) => HistoryResult::Other(serde_json::to_value(boxes)?),
        })
    }
}

/// Payload handed to the image generation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub model: String,
    pub mime_type: String,
    /// Base64 image data, without a `data:` prefix.
    pub image_base64: String,
    pub prompt: String,
    /// Regions the edit is restricted to, in normalized coordinates.
    pub rois: Vec<RoiShape>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, image: &Blob, prompt: impl Into<String>, rois: &[RoiShape]) -> Self {
        Self {
            model: model.into(),
            mime_type: image.mime_type.clone(),
            image_base64: image.to_base64(),
            prompt: prompt.into(),
            rois: rois.to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, DetectionError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Score used when the evaluator returns none.
pub const FALLBACK_QUALITY_SCORE: f64 = 88.0;

/// Parsed answer of the image quality evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityEvaluation {
    pub score: f64,
    pub feedback: String,
}

impl QualityEvaluation {
    /// Decode `{"score": n, "feedback": "..."}`.
    ///
    /// A missing or zero score and a missing or empty feedback fall back
    /// to defaults.
    pub fn parse(response: &str) -> Result<Self, DetectionError> {
        #[derive(Deserialize)]
        struct Raw {
            score: Option<f64>,
            feedback: Option<String>,
        }
        let raw: Raw = serde_json::from_str(strip_code_fences(response))?;
        Ok(Self {
            score: raw
                .score
                .filter(|s| *s != 0.0 && s.is_finite())
                .unwrap_or(FALLBACK_QUALITY_SCORE),
            feedback: raw
                .feedback
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| "Analysis complete.".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShapeId;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[2]\n```\n"), "[2]");
        assert_eq!(strip_code_fences("  [3] "), "[3]");
    }

    #[test]
    fn test_box_axes_swap() {
        let bbox = box_from_per_mille("cat", [0.0, 250.0, 500.0, 750.0]);
        assert_eq!(bbox.x, 0.25);
        assert_eq!(bbox.y, 0.0);
        assert_eq!(bbox.width, 0.5);
        assert_eq!(bbox.height, 0.5);
        assert_eq!(box_to_per_mille(&bbox), [0.0, 250.0, 500.0, 750.0]);
    }

    #[test]
    fn test_point_axes_swap() {
        let point = point_from_per_mille([250.0, 750.0]);
        assert_eq!(point, Point::new(0.75, 0.25));
    }

    #[test]
    fn test_parse_fenced_boxes() {
        let response = "```json\n[{\"box_2d\": [0, 0, 500, 250], \"label\": \"dog\"}]\n```";
        let detections = Detections::parse(DetectType::BoundingBoxes2D, response).unwrap();
        assert_eq!(
            detections,
            Detections::Boxes2D(vec![BoundingBox2D::new("dog", 0.0, 0.0, 0.25, 0.5)])
        );
        assert!(matches!(
            detections.into_history_result().unwrap(),
            HistoryResult::Boxes(_)
        ));
    }

    #[test]
    fn test_parse_masks_points_and_3d() {
        let masks = Detections::parse(
            DetectType::SegmentationMasks,
            r#"[{"box_2d":[0,0,1000,1000],"mask":"data:image/png;base64,AA==","label":"sky"}]"#,
        )
        .unwrap();
        let Detections::Masks(masks) = masks else {
            panic!("expected masks");
        };
        assert_eq!(masks[0].width, 1.0);
        assert_eq!(masks[0].image_data, "data:image/png;base64,AA==");

        let points =
            Detections::parse(DetectType::Points, r#"[{"point":[100,900],"label":"eye"}]"#).unwrap();
        assert_eq!(
            points,
            Detections::Points(vec![LabeledPoint {
                label: "eye".into(),
                x: 0.9,
                y: 0.1
            }])
        );

        let boxes = Detections::parse(
            DetectType::BoundingBoxes3D,
            r#"[{"box_3d":[1,2,3,4,5,6,7,8,9],"label":"car"}]"#,
        )
        .unwrap();
        let Detections::Boxes3D(boxes) = boxes else {
            panic!("expected 3d boxes");
        };
        assert_eq!(boxes[0].size, [4.0, 5.0, 6.0]);
        assert_eq!(boxes[0].rpy, [7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_synthetic_generation_is_not_a_detection() {
        assert!(matches!(
            Detections::parse(DetectType::SyntheticGeneration, "[]"),
            Err(DetectionError::NotADetection(_))
        ));
        assert!(Detections::parse(DetectType::Points, "not json").is_err());
    }

    #[test]
    fn test_generation_request_json() {
        let rois = vec![RoiShape::Circle {
            id: ShapeId(7),
            x: 0.5,
            y: 0.5,
            radius: 0.1,
        }];
        let request = GenerationRequest::new(
            "gemini-2.5-flash-image",
            &Blob::png(vec![1, 2, 3]),
            "make it red",
            &rois,
        );
        let json: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(json["imageBase64"], "AQID");
        assert_eq!(json["mimeType"], "image/png");
        assert_eq!(json["rois"][0]["type"], "circle");
        assert_eq!(json["rois"][0]["id"], "7");
    }

    #[test]
    fn test_quality_evaluation_defaults() {
        let eval = QualityEvaluation::parse(r#"{"score": 0}"#).unwrap();
        assert_eq!(eval.score, FALLBACK_QUALITY_SCORE);
        assert_eq!(eval.feedback, "Analysis complete.");

        let eval = QualityEvaluation::parse(r#"{"score": 72.5, "feedback": "soft edges"}"#).unwrap();
        assert_eq!(eval.score, 72.5);
        assert_eq!(eval.feedback, "soft edges");
    }
}
