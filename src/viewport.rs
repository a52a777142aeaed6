//! Editor viewport zoom and pan.
//!
//! The editor scales the media element around its centre and then translates
//! it by the pan offset, so pan values are expressed in unscaled pixels.
//! Screen-space drag deltas are divided by the zoom level before they are
//! accumulated.

use crate::constants::zoom;
use crate::geometry::ClientRect;

/// Zoom change applied per ctrl+wheel notch.
const WHEEL_ZOOM_STEP: f64 = 0.1;

/// Pan/zoom transform state of the editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Transform {
    /// Create a new transform with the given zoom and pan.
    pub fn new(zoom: f64, pan_x: f64, pan_y: f64) -> Self {
        Self { zoom, pan_x, pan_y }
    }

    /// Identity transform (zoom 1, no pan).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Zoom in by one button step, capped at the maximum zoom.
    pub fn zoom_in(&self) -> Transform {
        Transform {
            zoom: (self.zoom + zoom::STEP).min(zoom::MAX),
            ..*self
        }
    }

    /// Zoom out by one button step, floored at the minimum zoom.
    pub fn zoom_out(&self) -> Transform {
        Transform {
            zoom: (self.zoom - zoom::STEP).max(zoom::MIN),
            ..*self
        }
    }

    /// Apply a ctrl+wheel event. Scrolling down (`delta_y > 0`) zooms out.
    pub fn wheel(&self, delta_y: f64) -> Transform {
        let delta = if delta_y > 0.0 {
            -WHEEL_ZOOM_STEP
        } else {
            WHEEL_ZOOM_STEP
        };
        Transform {
            zoom: (self.zoom + delta).clamp(zoom::MIN, zoom::MAX),
            ..*self
        }
    }

    /// Accumulate a screen-space drag delta into the pan offset.
    pub fn pan_by_screen_delta(&self, dx: f64, dy: f64) -> Transform {
        Transform {
            zoom: self.zoom,
            pan_x: self.pan_x + dx / self.zoom,
            pan_y: self.pan_y + dy / self.zoom,
        }
    }

    /// On-screen rect of an element laid out at `rect` once this transform
    /// is applied around its centre (scale, then translate by the pan).
    pub fn apply_to_rect(&self, rect: ClientRect) -> ClientRect {
        let cx = rect.left + rect.width / 2.0 + self.pan_x * self.zoom;
        let cy = rect.top + rect.height / 2.0 + self.pan_y * self.zoom;
        let width = rect.width * self.zoom;
        let height = rect.height * self.zoom;
        ClientRect::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Zoom to `new_zoom` keeping the image point under the cursor fixed.
    ///
    /// Cursor and widget centre are in screen space; the result is clamped to
    /// the allowed zoom range.
    pub fn zoom_to_cursor(
        &self,
        new_zoom: f64,
        cursor_x: f64,
        cursor_y: f64,
        widget_center_x: f64,
        widget_center_y: f64,
    ) -> Transform {
        let new_zoom = new_zoom.clamp(zoom::MIN, zoom::MAX);
        let cursor_rel_x = cursor_x - widget_center_x;
        let cursor_rel_y = cursor_y - widget_center_y;

        // Image-space point under the cursor before zooming
        let img_x = (cursor_rel_x - self.pan_x) / self.zoom;
        let img_y = (cursor_rel_y - self.pan_y) / self.zoom;

        Transform {
            zoom: new_zoom,
            pan_x: cursor_rel_x - img_x * new_zoom,
            pan_y: cursor_rel_y - img_y * new_zoom,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
