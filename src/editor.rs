//! Editor session state.
//!
//! Owns everything the image editor mutates while the user works on one
//! image: the ROI collection, the gesture state machine, the viewport
//! transform, the active tool and the brush. Nothing here is persisted
//! directly; the workspace saves what it needs.

use crate::geometry::{ClientRect, Point, Size, contain_fit, slider_percent};
use crate::id::IdGenerator;
use crate::model::{BrushSettings, RoiShape, RoiTool};
use crate::roi::{DrawingContext, DrawingMachine, PointerCapture, PointerEvent, RoiStore};
use crate::viewport::Transform;

/// Initial position of the before/after comparison slider.
const DEFAULT_SLIDER_PERCENT: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct EditorState {
    pub rois: RoiStore,
    drawing: DrawingMachine,
    transform: Transform,
    ids: IdGenerator,
    tool: Option<RoiTool>,
    pub brush: BrushSettings,
    /// Natural size of the active image.
    media: Size,
    /// Bounding rect of the element the media is laid out in.
    container: ClientRect,
    slider: f64,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorState {
    pub fn new() -> Self {
        Self {
            rois: RoiStore::new(),
            drawing: DrawingMachine::new(),
            transform: Transform::identity(),
            ids: IdGenerator::new(),
            tool: None,
            brush: BrushSettings::default(),
            media: Size::zero(),
            container: ClientRect::default(),
            slider: DEFAULT_SLIDER_PERCENT,
        }
    }

    pub fn tool(&self) -> Option<RoiTool> {
        self.tool
    }

    /// Change the active tool. Any gesture in progress is cancelled.
    pub fn set_tool(&mut self, tool: Option<RoiTool>) {
        if self.tool != tool {
            self.drawing.cancel();
            self.tool = tool;
            log::debug!("Active tool: {}", tool.map_or("none", |t| t.name()));
        }
    }

    /// Handle a toolbar shortcut. Returns true if the key selected a tool.
    pub fn handle_hotkey(&mut self, key: char) -> bool {
        match RoiTool::from_hotkey(key) {
            Some(tool) => {
                self.set_tool(Some(tool));
                true
            }
            None => false,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn zoom_in(&mut self) {
        self.transform = self.transform.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.transform = self.transform.zoom_out();
    }

    /// Wheel events only zoom while ctrl is held. Returns true if the event
    /// was consumed.
    pub fn wheel(&mut self, delta_y: f64, ctrl: bool) -> bool {
        if !ctrl {
            return false;
        }
        self.transform = self.transform.wheel(delta_y);
        true
    }

    pub fn reset_view(&mut self) {
        self.transform = Transform::identity();
    }

    /// Set the natural size of the active image.
    pub fn set_media_size(&mut self, media: Size) {
        self.media = media;
    }

    /// Set the measured rect of the layout container.
    pub fn set_container(&mut self, container: ClientRect) {
        self.container = container;
    }

    /// On-screen size of the media at zoom 1.
    pub fn scaled_media_size(&self) -> Size {
        contain_fit(self.media, self.container.size())
    }

    /// Rect of the drawing surface that pointer positions are normalized
    /// against: the letterboxed media with the viewport transform applied.
    pub fn drawing_rect(&self) -> ClientRect {
        self.transform
            .apply_to_rect(ClientRect::centered_media(self.container, self.media))
    }

    pub fn cursor(&self) -> Option<Point> {
        self.drawing.cursor()
    }

    pub fn drawing(&self) -> &DrawingMachine {
        &self.drawing
    }

    fn context(&mut self) -> (&mut DrawingMachine, DrawingContext<'_>) {
        let container = self.drawing_rect();
        let scaled_width = self.scaled_media_size().width;
        (
            &mut self.drawing,
            DrawingContext {
                store: &mut self.rois,
                transform: &mut self.transform,
                ids: &mut self.ids,
                tool: self.tool,
                brush: self.brush,
                container,
                scaled_width,
            },
        )
    }

    pub fn pointer_down(&mut self, event: PointerEvent) -> PointerCapture {
        let (machine, mut ctx) = self.context();
        machine.pointer_down(event, &mut ctx)
    }

    pub fn pointer_move(&mut self, event: PointerEvent) {
        let (machine, mut ctx) = self.context();
        machine.pointer_move(event, &mut ctx);
    }

    pub fn pointer_up(&mut self) -> PointerCapture {
        self.drawing.pointer_up()
    }

    pub fn pointer_leave(&mut self) {
        self.drawing.pointer_leave();
    }

    pub fn finish_polygon(&mut self) -> bool {
        self.drawing.finish_polygon(&mut self.rois)
    }

    /// Delete the selected shape.
    pub fn delete_selected(&mut self) -> Option<RoiShape> {
        let id = self.rois.selected()?;
        self.drawing.cancel();
        self.rois.remove_shape(id)
    }

    /// Remove every shape (toolbar "clear").
    pub fn clear_rois(&mut self) {
        self.drawing.cancel();
        self.rois.clear_all();
    }

    /// Replace the ROI collection, e.g. when a gallery item is reopened.
    pub fn load_rois(&mut self, shapes: Vec<RoiShape>) {
        self.drawing.cancel();
        self.rois = RoiStore::from_shapes(shapes);
        let newest = self.rois.shapes().iter().map(|s| s.id().0).max().unwrap_or(0);
        if newest > self.ids.last() {
            self.ids = IdGenerator::starting_after(newest);
        }
    }

    pub fn slider_percent(&self) -> f64 {
        self.slider
    }

    /// Move the comparison slider to `client_x` within `rect`.
    pub fn move_slider(&mut self, client_x: f64, rect: &ClientRect) {
        self.slider = slider_percent(client_x, rect);
    }

    /// Return to a fresh editor, keeping the brush and the id sequence.
    pub fn reset(&mut self) {
        let brush = self.brush;
        let ids = self.ids.clone();
        *self = Self::new();
        self.brush = brush;
        self.ids = ids;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShapeId;

    fn editor() -> EditorState {
        let mut editor = EditorState::new();
        // 2:1 image in a 400x400 container: drawing rect is (0, 100, 400, 200).
        editor.set_media_size(Size::new(2000.0, 1000.0));
        editor.set_container(ClientRect::new(0.0, 0.0, 400.0, 400.0));
        editor
    }

    #[test]
    fn test_pointer_normalized_against_letterboxed_media() {
        let mut editor = editor();
        editor.set_tool(Some(RoiTool::Rectangle));
        editor.pointer_down(PointerEvent::new(100.0, 150.0));
        editor.pointer_move(PointerEvent::new(300.0, 250.0));
        editor.pointer_up();

        let RoiShape::Rectangle {
            x,
            y,
            width,
            height,
            ..
        } = editor.rois.shapes()[0]
        else {
            panic!("expected rectangle");
        };
        assert!((x - 0.25).abs() < 1e-9);
        assert!((y - 0.25).abs() < 1e-9);
        assert!((width - 0.5).abs() < 1e-9);
        assert!((height - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_pointer_follows_zoomed_surface() {
        let mut editor = editor();
        editor.zoom_in();
        editor.zoom_in();
        editor.zoom_in();
        editor.zoom_in();
        // Zoom 2: drawing rect is (-200, 0, 800, 400).
        let rect = editor.drawing_rect();
        assert!((rect.left + 200.0).abs() < 1e-9);
        assert!((rect.width - 800.0).abs() < 1e-9);

        editor.set_tool(Some(RoiTool::Circle));
        editor.pointer_down(PointerEvent::new(200.0, 200.0));
        let RoiShape::Circle { x, y, .. } = editor.rois.shapes()[0] else {
            panic!("expected circle");
        };
        assert!((x - 0.5).abs() < 1e-9);
        assert!((y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_requires_ctrl() {
        let mut editor = editor();
        assert!(!editor.wheel(100.0, false));
        assert_eq!(editor.transform().zoom, 1.0);
        assert!(editor.wheel(100.0, true));
        assert!((editor.transform().zoom - 0.9).abs() < 1e-9);

        editor.zoom_in();
        editor.reset_view();
        assert_eq!(editor.transform(), Transform::identity());
    }

    #[test]
    fn test_hotkeys_and_tool_change_cancels_gesture() {
        let mut editor = editor();
        assert!(editor.handle_hotkey('p'));
        editor.pointer_down(PointerEvent::new(100.0, 150.0));
        assert!(editor.drawing().is_drawing());

        assert!(editor.handle_hotkey('v'));
        assert_eq!(editor.tool(), Some(RoiTool::Select));
        assert!(!editor.drawing().is_drawing());
        assert!(!editor.handle_hotkey('z'));
    }

    #[test]
    fn test_delete_selected() {
        let mut editor = editor();
        editor.set_tool(Some(RoiTool::Circle));
        editor.pointer_down(PointerEvent::new(200.0, 200.0));
        editor.pointer_up();
        assert!(editor.delete_selected().is_some());
        assert!(editor.rois.is_empty());
        assert!(editor.delete_selected().is_none());
    }

    #[test]
    fn test_loaded_rois_do_not_collide_with_new_ids() {
        let mut editor = editor();
        let far_future = ShapeId(u64::MAX / 2);
        editor.load_rois(vec![RoiShape::Circle {
            id: far_future,
            x: 0.5,
            y: 0.5,
            radius: 0.1,
        }]);
        editor.set_tool(Some(RoiTool::Circle));
        editor.pointer_down(PointerEvent::new(100.0, 150.0));
        assert_eq!(editor.rois.len(), 2);
        assert!(editor.rois.shapes()[1].id() > far_future);
    }

    #[test]
    fn test_slider() {
        let mut editor = editor();
        assert_eq!(editor.slider_percent(), 50.0);
        editor.move_slider(300.0, &ClientRect::new(0.0, 0.0, 400.0, 100.0));
        assert_eq!(editor.slider_percent(), 75.0);
    }

    #[test]
    fn test_reset_keeps_brush() {
        let mut editor = editor();
        editor.brush.size = 12;
        editor.set_tool(Some(RoiTool::Brush));
        editor.zoom_in();
        editor.reset();
        assert_eq!(editor.brush.size, 12);
        assert_eq!(editor.tool(), None);
        assert_eq!(editor.transform(), Transform::identity());
    }
}
