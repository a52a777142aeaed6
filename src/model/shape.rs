//! Region-of-interest shapes and drawing tools.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::brush;
use crate::geometry::{Point, distance_to_segment, polygon_contains};

/// Identifier of an ROI shape.
///
/// Generated from the wall clock; serialized as a decimal string for
/// compatibility with stored ROI collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ShapeId(pub u64);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ShapeId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ShapeId)
    }
}

impl From<ShapeId> for String {
    fn from(id: ShapeId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ShapeId {
    type Error = ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Tip shape of a brush stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushShape {
    #[default]
    Round,
    Square,
}

impl BrushShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrushShape::Round => "round",
            BrushShape::Square => "square",
        }
    }

    /// Parse the stored representation; anything unknown is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "round" => Some(BrushShape::Round),
            "square" => Some(BrushShape::Square),
            _ => None,
        }
    }
}

/// Brush parameters applied to new brush strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    /// Diameter in screen pixels.
    pub size: u32,
    pub opacity: f64,
    pub shape: BrushShape,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            size: brush::DEFAULT_SIZE,
            opacity: brush::DEFAULT_OPACITY,
            shape: BrushShape::Round,
        }
    }
}

/// The kind of an ROI shape, without its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Polygon,
    Freehand,
    Brush,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Freehand => "freehand",
            ShapeKind::Brush => "brush",
        }
    }
}

/// Editor tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoiTool {
    Rectangle,
    Polygon,
    Circle,
    Freehand,
    Brush,
    /// Select existing shapes by clicking them.
    Select,
    /// Drag the viewport.
    Pan,
}

impl RoiTool {
    pub fn name(&self) -> &'static str {
        match self {
            RoiTool::Rectangle => "Rectangle",
            RoiTool::Polygon => "Polygon",
            RoiTool::Circle => "Circle",
            RoiTool::Freehand => "Freehand",
            RoiTool::Brush => "Brush",
            RoiTool::Select => "Select",
            RoiTool::Pan => "Pan",
        }
    }

    pub fn all() -> &'static [RoiTool] {
        &[
            RoiTool::Select,
            RoiTool::Pan,
            RoiTool::Rectangle,
            RoiTool::Circle,
            RoiTool::Polygon,
            RoiTool::Freehand,
            RoiTool::Brush,
        ]
    }

    /// Toolbar keyboard shortcut. Freehand has none.
    pub fn hotkey(&self) -> Option<char> {
        match self {
            RoiTool::Select => Some('V'),
            RoiTool::Pan => Some('H'),
            RoiTool::Brush => Some('B'),
            RoiTool::Rectangle => Some('R'),
            RoiTool::Circle => Some('C'),
            RoiTool::Polygon => Some('P'),
            RoiTool::Freehand => None,
        }
    }

    pub fn from_hotkey(key: char) -> Option<Self> {
        let key = key.to_ascii_uppercase();
        Self::all()
            .iter()
            .copied()
            .find(|tool| tool.hotkey() == Some(key))
    }

    /// The shape this tool creates, if it is a drawing tool.
    pub fn creates(&self) -> Option<ShapeKind> {
        match self {
            RoiTool::Rectangle => Some(ShapeKind::Rectangle),
            RoiTool::Polygon => Some(ShapeKind::Polygon),
            RoiTool::Circle => Some(ShapeKind::Circle),
            RoiTool::Freehand => Some(ShapeKind::Freehand),
            RoiTool::Brush => Some(ShapeKind::Brush),
            RoiTool::Select | RoiTool::Pan => None,
        }
    }
}

/// A region of interest in normalized image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RoiShape {
    /// Axis-aligned rectangle; `x`, `y` is the top-left corner.
    Rectangle {
        id: ShapeId,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Circle; `x`, `y` is the centre.
    Circle {
        id: ShapeId,
        x: f64,
        y: f64,
        radius: f64,
    },
    Polygon {
        id: ShapeId,
        points: Vec<Point>,
        #[serde(rename = "isFinished", default)]
        is_finished: bool,
    },
    Freehand {
        id: ShapeId,
        points: Vec<Point>,
    },
    Brush {
        id: ShapeId,
        points: Vec<Point>,
        /// Stroke width as a fraction of the image width.
        #[serde(rename = "strokeWidth")]
        stroke_width: f64,
        opacity: f64,
        #[serde(rename = "brushShape", default)]
        brush_shape: BrushShape,
    },
}

impl RoiShape {
    /// Zero-size shape of `kind` anchored at `start`, as created by pointer-down.
    pub fn start(kind: ShapeKind, id: ShapeId, start: Point, brush: &BrushSettings, stroke_width: f64) -> Self {
        match kind {
            ShapeKind::Rectangle => RoiShape::Rectangle {
                id,
                x: start.x,
                y: start.y,
                width: 0.0,
                height: 0.0,
            },
            ShapeKind::Circle => RoiShape::Circle {
                id,
                x: start.x,
                y: start.y,
                radius: 0.0,
            },
            ShapeKind::Polygon => RoiShape::Polygon {
                id,
                points: vec![start],
                is_finished: false,
            },
            ShapeKind::Freehand => RoiShape::Freehand {
                id,
                points: vec![start],
            },
            ShapeKind::Brush => RoiShape::Brush {
                id,
                points: vec![start],
                stroke_width,
                opacity: brush.opacity,
                brush_shape: brush.shape,
            },
        }
    }

    pub fn id(&self) -> ShapeId {
        match self {
            RoiShape::Rectangle { id, .. }
            | RoiShape::Circle { id, .. }
            | RoiShape::Polygon { id, .. }
            | RoiShape::Freehand { id, .. }
            | RoiShape::Brush { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            RoiShape::Rectangle { .. } => ShapeKind::Rectangle,
            RoiShape::Circle { .. } => ShapeKind::Circle,
            RoiShape::Polygon { .. } => ShapeKind::Polygon,
            RoiShape::Freehand { .. } => ShapeKind::Freehand,
            RoiShape::Brush { .. } => ShapeKind::Brush,
        }
    }

    /// Point sequence of point-based shapes.
    pub fn points(&self) -> Option<&[Point]> {
        match self {
            RoiShape::Polygon { points, .. }
            | RoiShape::Freehand { points, .. }
            | RoiShape::Brush { points, .. } => Some(points),
            RoiShape::Rectangle { .. } | RoiShape::Circle { .. } => None,
        }
    }

    /// Append a point to a point-based shape.
    ///
    /// Returns false for rectangles, circles and finished polygons.
    pub fn push_point(&mut self, point: Point) -> bool {
        match self {
            RoiShape::Polygon {
                points,
                is_finished: false,
                ..
            }
            | RoiShape::Freehand { points, .. }
            | RoiShape::Brush { points, .. } => {
                points.push(point);
                true
            }
            RoiShape::Polygon { .. } | RoiShape::Rectangle { .. } | RoiShape::Circle { .. } => {
                false
            }
        }
    }

    /// Whether all geometry is finite and sizes are non-negative.
    pub fn is_valid(&self) -> bool {
        match self {
            RoiShape::Rectangle {
                x,
                y,
                width,
                height,
                ..
            } => {
                x.is_finite()
                    && y.is_finite()
                    && width.is_finite()
                    && height.is_finite()
                    && *width >= 0.0
                    && *height >= 0.0
            }
            RoiShape::Circle { x, y, radius, .. } => {
                x.is_finite() && y.is_finite() && radius.is_finite() && *radius >= 0.0
            }
            RoiShape::Polygon { points, .. } | RoiShape::Freehand { points, .. } => {
                points.iter().all(Point::is_finite)
            }
            RoiShape::Brush {
                points,
                stroke_width,
                opacity,
                ..
            } => {
                points.iter().all(Point::is_finite)
                    && stroke_width.is_finite()
                    && *stroke_width >= 0.0
                    && opacity.is_finite()
            }
        }
    }

    /// Whether `point` lies inside this shape.
    ///
    /// Rectangle bounds are inclusive. Polygon and freehand outlines are
    /// treated as closed. A brush stroke contains points within half its
    /// stroke width of the stroke path.
    pub fn contains(&self, point: &Point) -> bool {
        match self {
            RoiShape::Rectangle {
                x,
                y,
                width,
                height,
                ..
            } => point.x >= *x && point.x <= x + width && point.y >= *y && point.y <= y + height,
            RoiShape::Circle { x, y, radius, .. } => point.distance_to(&Point::new(*x, *y)) <= *radius,
            RoiShape::Polygon { points, .. } | RoiShape::Freehand { points, .. } => {
                polygon_contains(points, point)
            }
            RoiShape::Brush {
                points,
                stroke_width,
                ..
            } => {
                let half = stroke_width / 2.0;
                match points.as_slice() {
                    [] => false,
                    [only] => point.distance_to(only) <= half,
                    _ => points
                        .windows(2)
                        .any(|w| distance_to_segment(point, &w[0], &w[1]) <= half),
                }
            }
        }
    }

    /// Shallow-merge `patch` into this shape.
    ///
    /// Patch fields that the variant does not have are ignored; the id and
    /// the variant never change.
    pub fn apply(&mut self, patch: &ShapePatch) {
        match self {
            RoiShape::Rectangle {
                x,
                y,
                width,
                height,
                ..
            } => {
                merge(x, patch.x);
                merge(y, patch.y);
                merge(width, patch.width);
                merge(height, patch.height);
            }
            RoiShape::Circle { x, y, radius, .. } => {
                merge(x, patch.x);
                merge(y, patch.y);
                merge(radius, patch.radius);
            }
            RoiShape::Polygon {
                points,
                is_finished,
                ..
            } => {
                merge(points, patch.points.clone());
                merge(is_finished, patch.is_finished);
            }
            RoiShape::Freehand { points, .. } => merge(points, patch.points.clone()),
            RoiShape::Brush {
                points,
                stroke_width,
                opacity,
                brush_shape,
                ..
            } => {
                merge(points, patch.points.clone());
                merge(stroke_width, patch.stroke_width);
                merge(opacity, patch.opacity);
                merge(brush_shape, patch.brush_shape);
            }
        }
    }
}

fn merge<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Partial shape update for [`RoiShape::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub radius: Option<f64>,
    pub points: Option<Vec<Point>>,
    pub is_finished: Option<bool>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub brush_shape: Option<BrushShape>,
}

impl ShapePatch {
    /// Patch replacing a rectangle's position and size.
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn radius(radius: f64) -> Self {
        Self {
            radius: Some(radius),
            ..Default::default()
        }
    }

    pub fn points(points: Vec<Point>) -> Self {
        Self {
            points: Some(points),
            ..Default::default()
        }
    }

    pub fn finished() -> Self {
        Self {
            is_finished: Some(true),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(id: u64, x: f64, y: f64, w: f64, h: f64) -> RoiShape {
        RoiShape::Rectangle {
            id: ShapeId(id),
            x,
            y,
            width: w,
            height: h,
        }
    }

    #[test]
    fn test_serialized_layout() {
        let shape = RoiShape::Brush {
            id: ShapeId(1700000000000),
            points: vec![Point::new(0.1, 0.2)],
            stroke_width: 0.05,
            opacity: 0.6,
            brush_shape: BrushShape::Square,
        };
        let json = serde_json::to_value(&shape).unwrap();
        assert_eq!(json["type"], "brush");
        assert_eq!(json["id"], "1700000000000");
        assert_eq!(json["strokeWidth"], 0.05);
        assert_eq!(json["brushShape"], "square");
    }

    #[test]
    fn test_parse_stored_polygon() {
        // Stored shapes may carry extra UI fields such as isSelected.
        let json = r#"{"id":"42","type":"polygon","isSelected":true,
            "points":[{"x":0.1,"y":0.1},{"x":0.5,"y":0.1}],"isFinished":false}"#;
        let shape: RoiShape = serde_json::from_str(json).unwrap();
        assert_eq!(shape.id(), ShapeId(42));
        assert_eq!(shape.kind(), ShapeKind::Polygon);
        assert_eq!(shape.points().map(<[Point]>::len), Some(2));
    }

    #[test]
    fn test_rectangle_contains_inclusive() {
        let r = rect(1, 0.2, 0.2, 0.4, 0.4);
        assert!(r.contains(&Point::new(0.2, 0.2)));
        assert!(r.contains(&Point::new(0.6, 0.6)));
        assert!(!r.contains(&Point::new(0.61, 0.5)));
    }

    #[test]
    fn test_circle_contains() {
        let c = RoiShape::Circle {
            id: ShapeId(1),
            x: 0.5,
            y: 0.5,
            radius: 0.1,
        };
        assert!(c.contains(&Point::new(0.6, 0.5)));
        assert!(!c.contains(&Point::new(0.6, 0.6)));
    }

    #[test]
    fn test_brush_contains_near_stroke() {
        let b = RoiShape::Brush {
            id: ShapeId(1),
            points: vec![Point::new(0.1, 0.5), Point::new(0.9, 0.5)],
            stroke_width: 0.1,
            opacity: 1.0,
            brush_shape: BrushShape::Round,
        };
        assert!(b.contains(&Point::new(0.5, 0.54)));
        assert!(!b.contains(&Point::new(0.5, 0.6)));
    }

    #[test]
    fn test_finished_polygon_does_not_grow() {
        let mut p = RoiShape::Polygon {
            id: ShapeId(1),
            points: vec![Point::new(0.0, 0.0)],
            is_finished: false,
        };
        assert!(p.push_point(Point::new(1.0, 0.0)));
        p.apply(&ShapePatch::finished());
        assert!(!p.push_point(Point::new(1.0, 1.0)));
        assert_eq!(p.points().map(<[Point]>::len), Some(2));
    }

    #[test]
    fn test_apply_ignores_foreign_fields() {
        let mut r = rect(7, 0.0, 0.0, 0.1, 0.1);
        r.apply(&ShapePatch {
            width: Some(0.3),
            radius: Some(0.9),
            ..Default::default()
        });
        assert_eq!(r, rect(7, 0.0, 0.0, 0.3, 0.1));
    }

    #[test]
    fn test_validity() {
        assert!(rect(1, 0.0, 0.0, 0.0, 0.0).is_valid());
        assert!(!rect(1, f64::NAN, 0.0, 0.1, 0.1).is_valid());
        assert!(!rect(1, 0.0, 0.0, -0.1, 0.1).is_valid());
    }

    #[test]
    fn test_tool_creates() {
        assert_eq!(RoiTool::Brush.creates(), Some(ShapeKind::Brush));
        assert_eq!(RoiTool::Select.creates(), None);
        assert_eq!(RoiTool::Pan.creates(), None);
        assert_eq!(RoiTool::all().len(), 7);
    }

    #[test]
    fn test_tool_hotkeys() {
        assert_eq!(RoiTool::from_hotkey('r'), Some(RoiTool::Rectangle));
        assert_eq!(RoiTool::from_hotkey('H'), Some(RoiTool::Pan));
        assert_eq!(RoiTool::from_hotkey('x'), None);
    }
}
