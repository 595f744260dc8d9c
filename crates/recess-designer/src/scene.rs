//! Scene model: a flat widget arena with explicit paint order.
//!
//! All relationships are expressed as id lists, never owning pointers, so
//! lookups are O(1) map access and cycles are impossible by construction.

use std::collections::HashMap;

use kurbo::{Point, Rect, Size};

use crate::widget::{Widget, WidgetId};

/// Precise hit-test tolerance in canvas pixels.
pub const HIT_TOLERANCE: f64 = 2.0;
/// Relaxed fallback tolerance used when the precise pass misses.
pub const HIT_TOLERANCE_RELAXED: f64 = 8.0;

/// The authoritative in-memory scene graph.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    widgets: HashMap<WidgetId, Widget>,
    /// Insertion order; breaks z-index ties.
    order: Vec<WidgetId>,
    /// Monotonic counter; newly created or newly-front widgets never
    /// collide with an existing maximum.
    next_z_index: i64,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from already-validated widgets (document load).
    ///
    /// `next_z_index` is raised above the highest widget z if the stored
    /// counter lags behind it.
    pub fn from_parts(widgets: Vec<Widget>, next_z_index: i64) -> Self {
        let mut scene = Self {
            next_z_index,
            ..Self::default()
        };
        for widget in widgets {
            scene.add_widget(widget);
        }
        scene
    }

    /// Allocate the next z-index.
    pub fn allocate_z(&mut self) -> i64 {
        let z = self.next_z_index;
        self.next_z_index += 1;
        z
    }

    pub fn next_z_index(&self) -> i64 {
        self.next_z_index
    }

    /// Insert a widget, returning its id.
    ///
    /// The z counter is bumped past the widget's z so later allocations
    /// stay above it.
    pub fn add_widget(&mut self, widget: Widget) -> WidgetId {
        let id = widget.id.clone();
        if widget.z_index >= self.next_z_index {
            self.next_z_index = widget.z_index + 1;
        }
        if self.widgets.insert(id.clone(), widget).is_none() {
            self.order.push(id.clone());
        } else {
            log::warn!("scene: replaced existing widget {id}");
        }
        id
    }

    /// Remove a widget, returning its snapshot. Logged no-op on unknown ids.
    pub fn remove_widget(&mut self, id: &str) -> Option<Widget> {
        let removed = self.widgets.remove(id);
        if removed.is_some() {
            self.order.retain(|other| other != id);
        } else {
            log::warn!("scene: remove_widget on unknown widget {id}");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Widget> {
        self.widgets.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Widget> {
        self.widgets.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.widgets.contains_key(id)
    }

    /// Set a widget's position. Logged no-op on unknown ids.
    pub fn set_position(&mut self, id: &str, position: Point) {
        match self.widgets.get_mut(id) {
            Some(widget) => widget.position = position,
            None => log::warn!("scene: set_position on unknown widget {id}"),
        }
    }

    /// Set a widget's size. Logged no-op on unknown ids.
    pub fn set_size(&mut self, id: &str, size: Size) {
        match self.widgets.get_mut(id) {
            Some(widget) => widget.size = size,
            None => log::warn!("scene: set_size on unknown widget {id}"),
        }
    }

    /// Set a widget's z-index, keeping the counter above it.
    /// Logged no-op on unknown ids.
    pub fn set_z_index(&mut self, id: &str, z_index: i64) {
        match self.widgets.get_mut(id) {
            Some(widget) => {
                widget.z_index = z_index;
                if z_index >= self.next_z_index {
                    self.next_z_index = z_index + 1;
                }
            }
            None => log::warn!("scene: set_z_index on unknown widget {id}"),
        }
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Widgets in insertion order.
    pub fn widgets(&self) -> impl Iterator<Item = &Widget> {
        self.order.iter().filter_map(|id| self.widgets.get(id))
    }

    /// Widgets from front to back: highest z first, insertion order
    /// breaking ties (later insertions paint above).
    pub fn iter_by_z_descending(&self) -> impl Iterator<Item = &Widget> {
        let mut ordered: Vec<&Widget> = self.widgets().collect();
        // Stable sort keeps insertion order within equal z; reversing then
        // puts later insertions first.
        ordered.sort_by_key(|widget| widget.z_index);
        ordered.into_iter().rev()
    }

    /// The group widget containing `id`, if any.
    pub fn containing_group(&self, id: &str) -> Option<&Widget> {
        self.widgets.values().find(|widget| {
            widget
                .as_group()
                .is_some_and(|group| group.child_ids.iter().any(|child| child == id))
        })
    }

    /// Whether `id` is a child of some group (and therefore not a direct
    /// target for pointer interaction).
    pub fn is_grouped(&self, id: &str) -> bool {
        self.containing_group(id).is_some()
    }

    /// Top-most interactive widget at a point, grouped children skipped.
    pub fn topmost_at(&self, point: Point, tolerance: f64) -> Option<&Widget> {
        self.iter_by_z_descending()
            .filter(|widget| !self.is_grouped(&widget.id))
            .find(|widget| widget.hit_test(point, tolerance))
    }

    /// Hit test with the precise tolerance, falling back to the relaxed
    /// tolerance when the precise pass misses.
    pub fn hit_test(&self, point: Point) -> Option<WidgetId> {
        self.topmost_at(point, HIT_TOLERANCE)
            .or_else(|| self.topmost_at(point, HIT_TOLERANCE_RELAXED))
            .map(|widget| widget.id.clone())
    }

    /// Interactive widgets whose rectangle intersects `rect`, back to
    /// front. Grouped children are skipped.
    pub fn widgets_in_rect(&self, rect: Rect) -> Vec<WidgetId> {
        let mut hits: Vec<&Widget> = self
            .widgets()
            .filter(|widget| !self.is_grouped(&widget.id))
            .filter(|widget| rect.intersect(widget.bounds()).area() > 0.0)
            .collect();
        hits.sort_by_key(|widget| widget.z_index);
        hits.into_iter().map(|widget| widget.id.clone()).collect()
    }

    /// Remove every widget.
    pub fn clear(&mut self) {
        self.widgets.clear();
        self.order.clear();
    }
}
