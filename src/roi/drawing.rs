//! Pointer-gesture state machine for drawing ROIs and panning the viewport.
//!
//! The host forwards pointer events in client (viewport) pixels together
//! with the bounding rect of the drawing container. Positions are
//! normalized against that rect, so shapes stay anchored to the image at
//! any zoom level.

use crate::geometry::{ClientRect, Point};
use crate::id::IdGenerator;
use crate::model::{BrushSettings, RoiShape, RoiTool, ShapeId, ShapeKind, ShapePatch};
use crate::roi::store::RoiStore;
use crate::viewport::Transform;

/// Mouse button of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

/// A pointer event in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f64,
    pub client_y: f64,
    pub button: PointerButton,
}

impl PointerEvent {
    pub fn new(client_x: f64, client_y: f64) -> Self {
        Self {
            client_x,
            client_y,
            button: PointerButton::Primary,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }
}

/// What the host should do with pointer capture after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerCapture {
    /// Start routing all pointer events to the drawing surface.
    Acquire,
    /// Stop capturing.
    Release,
    /// Leave capture as it is.
    Keep,
}

/// Gesture currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawingState {
    #[default]
    Idle,
    /// A shape is being drawn; `start` is the normalized pointer-down position.
    Drawing { shape_id: ShapeId, start: Point },
    /// The viewport is being dragged; positions are client pixels.
    Panning { last_client: Point },
}

/// Everything a gesture may read or mutate.
pub struct DrawingContext<'a> {
    pub store: &'a mut RoiStore,
    pub transform: &'a mut Transform,
    pub ids: &'a mut IdGenerator,
    pub tool: Option<RoiTool>,
    pub brush: BrushSettings,
    /// On-screen rect of the drawing container, zoom and pan included.
    pub container: ClientRect,
    /// Width of the media element at zoom 1; brush sizes are relative to it.
    pub scaled_width: f64,
}

/// Drawing/panning state machine. One gesture at a time.
#[derive(Debug, Clone, Default)]
pub struct DrawingMachine {
    state: DrawingState,
    cursor: Option<Point>,
}

impl DrawingMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DrawingState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawingState::Drawing { .. })
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.state, DrawingState::Panning { .. })
    }

    /// Last normalized pointer position over the drawing surface.
    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    pub fn pointer_down(&mut self, event: PointerEvent, ctx: &mut DrawingContext<'_>) -> PointerCapture {
        if self.state != DrawingState::Idle {
            log::trace!("Ignoring pointer-down during {:?}", self.state);
            return PointerCapture::Keep;
        }

        if ctx.tool == Some(RoiTool::Pan) || event.button == PointerButton::Middle {
            self.state = DrawingState::Panning {
                last_client: Point::new(event.client_x, event.client_y),
            };
            return PointerCapture::Acquire;
        }

        let Some(tool) = ctx.tool else {
            return PointerCapture::Keep;
        };
        let Some(pos) = ctx.container.normalize(event.client_x, event.client_y) else {
            return PointerCapture::Keep;
        };

        let Some(kind) = tool.creates() else {
            // Select tool: pick the topmost shape under the pointer, or nothing.
            let found = ctx.store.hit_test(&pos);
            log::trace!("Select at ({:.3}, {:.3}): {:?}", pos.x, pos.y, found);
            ctx.store.select_shape(found);
            return PointerCapture::Acquire;
        };

        let shape_id = ShapeId(ctx.ids.next_id());
        let stroke_width = if kind == ShapeKind::Brush && ctx.scaled_width > 0.0 {
            f64::from(ctx.brush.size) / ctx.scaled_width
        } else {
            0.0
        };
        let shape = RoiShape::start(kind, shape_id, pos, &ctx.brush, stroke_width);
        if !ctx.store.add_shape(shape) {
            return PointerCapture::Keep;
        }
        ctx.store.select_shape(Some(shape_id));
        log::debug!("Started {} ROI {}", kind.name(), shape_id);

        self.state = DrawingState::Drawing {
            shape_id,
            start: pos,
        };
        PointerCapture::Acquire
    }

    pub fn pointer_move(&mut self, event: PointerEvent, ctx: &mut DrawingContext<'_>) {
        if let DrawingState::Panning { last_client } = self.state {
            let dx = event.client_x - last_client.x;
            let dy = event.client_y - last_client.y;
            *ctx.transform = ctx.transform.pan_by_screen_delta(dx, dy);
            self.state = DrawingState::Panning {
                last_client: Point::new(event.client_x, event.client_y),
            };
        }

        let Some(pos) = ctx.container.normalize(event.client_x, event.client_y) else {
            return;
        };
        self.cursor = Some(pos);

        let DrawingState::Drawing { shape_id, start } = self.state else {
            return;
        };
        let Some(kind) = ctx.store.get(shape_id).map(RoiShape::kind) else {
            // Shape was removed mid-gesture.
            self.state = DrawingState::Idle;
            return;
        };

        match kind {
            ShapeKind::Rectangle => {
                let patch = ShapePatch::rect(
                    pos.x.min(start.x),
                    pos.y.min(start.y),
                    (pos.x - start.x).abs(),
                    (pos.y - start.y).abs(),
                );
                ctx.store.update_shape(shape_id, &patch);
            }
            ShapeKind::Circle => {
                ctx.store
                    .update_shape(shape_id, &ShapePatch::radius(pos.distance_to(&start)));
            }
            ShapeKind::Polygon | ShapeKind::Freehand | ShapeKind::Brush => {
                ctx.store.push_point(shape_id, pos);
            }
        }
    }

    /// End the gesture. Polygons stay open until finished explicitly.
    pub fn pointer_up(&mut self) -> PointerCapture {
        if let DrawingState::Drawing { shape_id, .. } = self.state {
            log::debug!("Finished drawing ROI {}", shape_id);
        }
        self.state = DrawingState::Idle;
        PointerCapture::Release
    }

    pub fn pointer_leave(&mut self) {
        self.cursor = None;
    }

    /// Abort the current gesture without touching any shape.
    pub fn cancel(&mut self) {
        self.state = DrawingState::Idle;
    }

    /// Finish the selected polygon (double-click or button).
    pub fn finish_polygon(&mut self, store: &mut RoiStore) -> bool {
        let Some(id) = store.selected() else {
            return false;
        };
        if matches!(self.state, DrawingState::Drawing { shape_id, .. } if shape_id == id) {
            self.state = DrawingState::Idle;
        }
        store.finish_polygon(id)
    }
}
