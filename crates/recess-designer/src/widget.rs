//! Widget data model for the designer scene.

use kurbo::{Point, Rect, Size};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique identifier for widgets.
///
/// Ids loaded from a document are preserved verbatim; generated ids are
/// UUIDv4 strings.
pub type WidgetId = String;

/// Generate a fresh widget id.
pub fn generate_id() -> WidgetId {
    Uuid::new_v4().to_string()
}

/// Type tag of a widget.
///
/// Only `Group` is interpreted by the engine; for every other kind the
/// `properties` bag is presentation data owned by the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    /// Plain colored box.
    Box,
    /// Text label.
    Text,
    /// QR code.
    Qr,
    /// Composite of other widgets.
    Group(GroupData),
    /// Unknown type tag preserved opaquely for forward compatibility.
    Other(String),
}

impl WidgetKind {
    /// The persisted type tag.
    pub fn type_tag(&self) -> &str {
        match self {
            WidgetKind::Box => "box",
            WidgetKind::Text => "text",
            WidgetKind::Qr => "qr",
            WidgetKind::Group(_) => "group",
            WidgetKind::Other(tag) => tag,
        }
    }
}

/// Group bookkeeping carried first-class on the kind tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupData {
    /// Ordered child widget ids.
    pub child_ids: Vec<WidgetId>,
    /// Each child's z-index captured when the group was created.
    /// Restored on ungroup; may be shorter than `child_ids` for documents
    /// written by older builds.
    pub child_z: Vec<i64>,
}

/// A placed visual element on the canvas.
///
/// The transient selected/reference flags are not stored here; they live in
/// the selection manager and are joined by id at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub id: WidgetId,
    /// Top-left corner in canvas-local coordinates.
    pub position: Point,
    pub size: Size,
    /// Paint order; higher paints above lower, ties broken by insertion
    /// order.
    pub z_index: i64,
    pub kind: WidgetKind,
    /// Open bag of presentation attributes, opaque to the engine.
    pub properties: Map<String, Value>,
}

impl Widget {
    /// Create a widget with a generated id and a zero z-index.
    pub fn new(kind: WidgetKind, position: Point, size: Size) -> Self {
        Self {
            id: generate_id(),
            position,
            size,
            z_index: 0,
            kind,
            properties: Map::new(),
        }
    }

    /// The widget's rectangle in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Replace position and size from a rectangle.
    pub fn set_bounds(&mut self, rect: Rect) {
        self.position = rect.origin();
        self.size = rect.size();
    }

    /// Check if a point hits this widget's rectangle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, WidgetKind::Group(_))
    }

    pub fn as_group(&self) -> Option<&GroupData> {
        match &self.kind {
            WidgetKind::Group(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut GroupData> {
        match &mut self.kind {
            WidgetKind::Group(data) => Some(data),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Widget::new(WidgetKind::Box, Point::ZERO, Size::new(10.0, 10.0));
        let b = Widget::new(WidgetKind::Box, Point::ZERO, Size::new(10.0, 10.0));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_bounds() {
        let w = Widget::new(
            WidgetKind::Text,
            Point::new(10.0, 20.0),
            Size::new(100.0, 50.0),
        );
        let bounds = w.bounds();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 20.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 110.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test_with_tolerance() {
        let w = Widget::new(WidgetKind::Box, Point::ZERO, Size::new(100.0, 100.0));
        assert!(w.hit_test(Point::new(50.0, 50.0), 0.0));
        assert!(!w.hit_test(Point::new(104.0, 50.0), 0.0));
        assert!(w.hit_test(Point::new(104.0, 50.0), 5.0));
    }

    #[test]
    fn test_type_tags_round_trip_unknown() {
        let kind = WidgetKind::Other("clock".to_string());
        assert_eq!(kind.type_tag(), "clock");
        assert_eq!(WidgetKind::Qr.type_tag(), "qr");
    }
}
