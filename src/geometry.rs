//! Normalized image coordinates and viewport-to-image mapping.
//!
//! All annotation geometry lives in image-normalized space: `(0, 0)` is the
//! top-left corner of the image and `(1, 1)` the bottom-right, independent of
//! the zoom level or the size of the container the image is displayed in.
//! Conversion to pixels happens only when rendering (scaled media size) or
//! exporting (original image size).

use serde::{Deserialize, Serialize};

/// A 2D point. Normalized unless stated otherwise by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Scale a normalized point by the given dimensions.
    ///
    /// Pass the scaled media size for rendering and the original pixel size
    /// for export.
    pub fn denormalize(&self, size: Size) -> Point {
        Point::new(self.x * size.width, self.y * size.height)
    }

    /// Whether both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height of an image or on-screen element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A size with zero width and height.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Whether either dimension is zero (or not a positive number).
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Fit `media` into `container` preserving aspect ratio ("contain" fit).
///
/// Returns the on-screen size of the letterboxed media element. If either
/// size is empty the result is zero, matching a layout that has not been
/// measured yet.
pub fn contain_fit(media: Size, container: Size) -> Size {
    if media.is_empty() || container.is_empty() {
        return Size::zero();
    }

    let aspect = media.aspect_ratio();
    if aspect < container.aspect_ratio() {
        Size::new(container.height * aspect, container.height)
    } else {
        Size::new(container.width, container.width / aspect)
    }
}

/// Bounding rectangle of an on-screen element in client (viewport) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle of the letterboxed media element centred in `container`.
    pub fn centered_media(container: ClientRect, media: Size) -> Self {
        let fitted = contain_fit(media, container.size());
        Self {
            left: container.left + (container.width - fitted.width) / 2.0,
            top: container.top + (container.height - fitted.height) / 2.0,
            width: fitted.width,
            height: fitted.height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Map client coordinates to normalized coordinates within this rect.
    ///
    /// Values outside the rect are returned unclamped; consumers clamp when
    /// they need to. Returns `None` when the rect has no area.
    pub fn normalize(&self, client_x: f64, client_y: f64) -> Option<Point> {
        if self.size().is_empty() {
            return None;
        }
        Some(Point::new(
            (client_x - self.left) / self.width,
            (client_y - self.top) / self.height,
        ))
    }
}

/// Position of a before/after comparison slider, as a percentage in [0, 100].
pub fn slider_percent(client_x: f64, rect: &ClientRect) -> f64 {
    if rect.width <= 0.0 {
        return 0.0;
    }
    let position = (client_x - rect.left) / rect.width * 100.0;
    position.clamp(0.0, 100.0)
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Point-in-polygon test using ray casting.
///
/// The outline is treated as closed. Fewer than three vertices never
/// contain anything.
pub fn polygon_contains(vertices: &[Point], point: &Point) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let vi = &vertices[i];
        let vj = &vertices[j];
        if ((vi.y > point.y) != (vj.y > point.y))
            && (point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_contain_fit_wide_media() {
        // 2:1 image in a 400x400 container fills the width.
        let fitted = contain_fit(Size::new(2000.0, 1000.0), Size::new(400.0, 400.0));
        assert!(approx_eq(fitted.width, 400.0));
        assert!(approx_eq(fitted.height, 200.0));
    }

    #[test]
    fn test_contain_fit_tall_media() {
        let fitted = contain_fit(Size::new(500.0, 1000.0), Size::new(800.0, 400.0));
        assert!(approx_eq(fitted.width, 200.0));
        assert!(approx_eq(fitted.height, 400.0));
    }

    #[test]
    fn test_contain_fit_unmeasured() {
        assert_eq!(
            contain_fit(Size::new(100.0, 100.0), Size::zero()),
            Size::zero()
        );
        assert_eq!(
            contain_fit(Size::zero(), Size::new(100.0, 100.0)),
            Size::zero()
        );
    }

    #[test]
    fn test_normalize_inside_and_outside() {
        let rect = ClientRect::new(100.0, 50.0, 200.0, 100.0);
        let p = rect.normalize(150.0, 75.0).unwrap();
        assert!(approx_eq(p.x, 0.25));
        assert!(approx_eq(p.y, 0.25));

        // Not clamped at capture time.
        let outside = rect.normalize(350.0, 0.0).unwrap();
        assert!(approx_eq(outside.x, 1.25));
        assert!(approx_eq(outside.y, -0.5));
    }

    #[test]
    fn test_normalize_empty_rect() {
        assert!(ClientRect::default().normalize(1.0, 1.0).is_none());
    }

    #[test]
    fn test_centered_media_letterbox() {
        let container = ClientRect::new(0.0, 0.0, 400.0, 400.0);
        let media = ClientRect::centered_media(container, Size::new(200.0, 100.0));
        assert!(approx_eq(media.left, 0.0));
        assert!(approx_eq(media.top, 100.0));
        assert!(approx_eq(media.width, 400.0));
        assert!(approx_eq(media.height, 200.0));
    }

    #[test]
    fn test_denormalize() {
        let p = Point::new(0.25, 0.5).denormalize(Size::new(640.0, 480.0));
        assert!(approx_eq(p.x, 160.0));
        assert!(approx_eq(p.y, 240.0));
    }

    #[test]
    fn test_slider_percent_clamped() {
        let rect = ClientRect::new(10.0, 0.0, 100.0, 50.0);
        assert!(approx_eq(slider_percent(60.0, &rect), 50.0));
        assert!(approx_eq(slider_percent(-40.0, &rect), 0.0));
        assert!(approx_eq(slider_percent(500.0, &rect), 100.0));
    }

    #[test]
    fn test_polygon_contains() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert!(polygon_contains(&square, &Point::new(0.5, 0.5)));
        assert!(!polygon_contains(&square, &Point::new(1.5, 0.5)));
        assert!(!polygon_contains(&square[..2], &Point::new(0.5, 0.0)));
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);
        assert!(approx_eq(distance_to_segment(&Point::new(0.5, 0.2), &a, &b), 0.2));
        assert!(approx_eq(distance_to_segment(&Point::new(2.0, 0.0), &a, &b), 1.0));
        assert!(approx_eq(distance_to_segment(&Point::new(0.0, 0.3), &a, &a), 0.3));
    }
}
