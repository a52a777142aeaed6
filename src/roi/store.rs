//! Ordered collection of ROI shapes with a single selection.

use crate::geometry::Point;
use crate::model::{RoiShape, ShapeId, ShapePatch};

/// The active image's regions of interest.
///
/// Insertion order is z-order: later shapes are drawn on top and are
/// hit-tested first.
#[derive(Debug, Clone, Default)]
pub struct RoiStore {
    shapes: Vec<RoiShape>,
    selected: Option<ShapeId>,
    dirty: bool,
}

impl RoiStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a previously saved collection.
    ///
    /// Shapes with duplicate ids or invalid geometry are dropped.
    pub fn from_shapes(shapes: impl IntoIterator<Item = RoiShape>) -> Self {
        let mut store = Self::new();
        for shape in shapes {
            store.add_shape(shape);
        }
        store.dirty = false;
        store
    }

    /// Check if the store has been modified since last clear_dirty().
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Append a shape. Returns false if its id is already present or its
    /// geometry is not finite.
    pub fn add_shape(&mut self, shape: RoiShape) -> bool {
        let id = shape.id();
        if self.get(id).is_some() {
            log::warn!("Rejecting ROI with duplicate id {}", id);
            return false;
        }
        if !shape.is_valid() {
            log::warn!("Rejecting ROI {} with invalid geometry", id);
            return false;
        }
        log::trace!("Added {} ROI {}", shape.kind().name(), id);
        self.shapes.push(shape);
        self.dirty = true;
        true
    }

    /// Merge `patch` into the shape with `id`.
    ///
    /// Returns false if no such shape exists or the result would not be
    /// valid geometry; the shape is left unchanged in that case.
    pub fn update_shape(&mut self, id: ShapeId, patch: &ShapePatch) -> bool {
        let Some(shape) = self.shapes.iter_mut().find(|s| s.id() == id) else {
            return false;
        };

        let mut updated = shape.clone();
        updated.apply(patch);
        if !updated.is_valid() {
            log::debug!("Ignoring update producing invalid geometry for ROI {}", id);
            return false;
        }
        *shape = updated;
        self.dirty = true;
        true
    }

    /// Append a point to a point-based shape (polygon, freehand, brush).
    pub fn push_point(&mut self, id: ShapeId, point: Point) -> bool {
        if !point.is_finite() {
            return false;
        }
        let pushed = self
            .shapes
            .iter_mut()
            .find(|s| s.id() == id)
            .is_some_and(|s| s.push_point(point));
        if pushed {
            self.dirty = true;
        }
        pushed
    }

    /// Remove a shape, clearing the selection if it was selected.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<RoiShape> {
        let index = self.shapes.iter().position(|s| s.id() == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.dirty = true;
        Some(self.shapes.remove(index))
    }

    /// Remove every shape and the selection.
    pub fn clear_all(&mut self) {
        if !self.shapes.is_empty() || self.selected.is_some() {
            self.dirty = true;
        }
        self.shapes.clear();
        self.selected = None;
    }

    /// Select a shape. Selecting an id that is not present clears the selection.
    pub fn select_shape(&mut self, id: Option<ShapeId>) {
        let id = id.filter(|id| self.get(*id).is_some());
        if self.selected != id {
            self.selected = id;
            self.dirty = true;
        }
    }

    /// Mark a polygon as finished so it no longer grows.
    pub fn finish_polygon(&mut self, id: ShapeId) -> bool {
        match self.get(id) {
            Some(RoiShape::Polygon { .. }) => self.update_shape(id, &ShapePatch::finished()),
            _ => false,
        }
    }

    /// Topmost shape containing `point`.
    pub fn hit_test(&self, point: &Point) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .find(|s| s.contains(point))
            .map(RoiShape::id)
    }

    pub fn shapes(&self) -> &[RoiShape] {
        &self.shapes
    }

    pub fn get(&self, id: ShapeId) -> Option<&RoiShape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn selected(&self) -> Option<ShapeId> {
        self.selected
    }

    pub fn selected_shape(&self) -> Option<&RoiShape> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Serialize the collection in its stored JSON layout.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.shapes)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let shapes: Vec<RoiShape> = serde_json::from_str(json)?;
        Ok(Self::from_shapes(shapes))
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
    fn test_duplicate_id_rejected() {
        let mut store = RoiStore::new();
        assert!(store.add_shape(rect(1, 0.0, 0.0, 0.1, 0.1)));
        assert!(!store.add_shape(rect(1, 0.5, 0.5, 0.1, 0.1)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_geometry_not_deduplicated() {
        let mut store = RoiStore::new();
        assert!(store.add_shape(rect(1, 0.0, 0.0, 0.1, 0.1)));
        assert!(store.add_shape(rect(2, 0.0, 0.0, 0.1, 0.1)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_topmost_hit_wins() {
        let mut store = RoiStore::new();
        store.add_shape(rect(1, 0.0, 0.0, 0.5, 0.5));
        store.add_shape(rect(2, 0.25, 0.25, 0.5, 0.5));

        assert_eq!(store.hit_test(&Point::new(0.3, 0.3)), Some(ShapeId(2)));
        assert_eq!(store.hit_test(&Point::new(0.1, 0.1)), Some(ShapeId(1)));
        assert_eq!(store.hit_test(&Point::new(0.9, 0.1)), None);
    }

    #[test]
    fn test_remove_selected_clears_selection() {
        let mut store = RoiStore::new();
        store.add_shape(rect(1, 0.0, 0.0, 0.5, 0.5));
        store.select_shape(Some(ShapeId(1)));
        assert_eq!(store.selected(), Some(ShapeId(1)));

        assert!(store.remove_shape(ShapeId(1)).is_some());
        assert_eq!(store.selected(), None);
        assert!(store.remove_shape(ShapeId(1)).is_none());
    }

    #[test]
    fn test_select_missing_id_is_none() {
        let mut store = RoiStore::new();
        store.add_shape(rect(1, 0.0, 0.0, 0.5, 0.5));
        store.select_shape(Some(ShapeId(99)));
        assert_eq!(store.selected(), None);
        assert!(store.selected_shape().is_none());
    }

    #[test]
    fn test_update_missing_and_invalid() {
        let mut store = RoiStore::new();
        store.add_shape(rect(1, 0.0, 0.0, 0.5, 0.5));
        assert!(!store.update_shape(ShapeId(2), &ShapePatch::rect(0.0, 0.0, 1.0, 1.0)));
        assert!(!store.update_shape(ShapeId(1), &ShapePatch::rect(0.0, 0.0, -1.0, 1.0)));
        assert_eq!(store.get(ShapeId(1)), Some(&rect(1, 0.0, 0.0, 0.5, 0.5)));
    }

    #[test]
    fn test_finish_polygon_only_for_polygons() {
        let mut store = RoiStore::new();
        store.add_shape(rect(1, 0.0, 0.0, 0.5, 0.5));
        store.add_shape(RoiShape::Polygon {
            id: ShapeId(2),
            points: vec![Point::new(0.1, 0.1)],
            is_finished: false,
        });
        assert!(!store.finish_polygon(ShapeId(1)));
        assert!(store.finish_polygon(ShapeId(2)));
        assert!(!store.push_point(ShapeId(2), Point::new(0.2, 0.2)));
    }

    #[test]
    fn test_clear_all_and_dirty_tracking() {
        let mut store = RoiStore::from_shapes([rect(1, 0.0, 0.0, 0.5, 0.5)]);
        assert!(!store.is_dirty());
        store.select_shape(Some(ShapeId(1)));
        assert!(store.is_dirty());
        store.clear_dirty();

        store.clear_all();
        assert!(store.is_empty());
        assert_eq!(store.selected(), None);
        assert!(store.is_dirty());
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let store = RoiStore::from_shapes([
            rect(3, 0.0, 0.0, 0.5, 0.5),
            rect(1, 0.1, 0.1, 0.2, 0.2),
        ]);
        let restored = RoiStore::from_json(&store.to_json().unwrap()).unwrap();
        let ids: Vec<_> = restored.shapes().iter().map(RoiShape::id).collect();
        assert_eq!(ids, vec![ShapeId(3), ShapeId(1)]);
    }
}
