//! Pointer gesture state and geometry.
//!
//! A gesture exists only between pointer-down and pointer-up/cancel:
//! Idle -> {Moving, Resizing, BoxSelecting} -> Idle, with a cancel exit
//! from any active state. The [`crate::editor::Editor`] drives the state
//! machine; this module holds the transient state and the pure math.

use std::collections::HashMap;

use kurbo::{Point, Rect, Vec2};

use crate::widget::WidgetId;

/// Pointer travel (per axis) required before a box-select marquee
/// activates; shorter motions count as a deselect click.
pub const DRAG_THRESHOLD: f64 = 5.0;
/// Hit tolerance for resize handles.
pub const HANDLE_TOLERANCE: f64 = 8.0;
/// Smallest widget dimension a resize can produce.
pub const MIN_RESIZE_SIZE: f64 = 1.0;

/// Identifier of the pointer that owns a gesture; events from any other
/// pointer are ignored while the gesture is active.
pub type PointerId = u64;

/// Corner resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeHandle {
    /// The handle's anchor point on a rectangle.
    pub fn position(self, rect: Rect) -> Point {
        match self {
            ResizeHandle::TopLeft => Point::new(rect.x0, rect.y0),
            ResizeHandle::TopRight => Point::new(rect.x1, rect.y0),
            ResizeHandle::BottomLeft => Point::new(rect.x0, rect.y1),
            ResizeHandle::BottomRight => Point::new(rect.x1, rect.y1),
        }
    }

    const ALL: [ResizeHandle; 4] = [
        ResizeHandle::TopLeft,
        ResizeHandle::TopRight,
        ResizeHandle::BottomLeft,
        ResizeHandle::BottomRight,
    ];
}

/// Which corner handle of `rect`, if any, the point lands on.
pub fn handle_at(rect: Rect, point: Point, tolerance: f64) -> Option<ResizeHandle> {
    ResizeHandle::ALL.into_iter().find(|handle| {
        let pos = handle.position(rect);
        let dx = point.x - pos.x;
        let dy = point.y - pos.y;
        dx * dx + dy * dy <= tolerance * tolerance
    })
}

/// Corner-anchored resize of `original` by `delta`.
///
/// The dragged corner follows the pointer while the opposite corner stays
/// fixed; axes are normalized on crossover and dimensions clamped to
/// [`MIN_RESIZE_SIZE`].
pub fn resize_rect(original: Rect, handle: ResizeHandle, delta: Vec2) -> Rect {
    let (x0, y0, x1, y1) = match handle {
        ResizeHandle::TopLeft => (
            original.x0 + delta.x,
            original.y0 + delta.y,
            original.x1,
            original.y1,
        ),
        ResizeHandle::TopRight => (
            original.x0,
            original.y0 + delta.y,
            original.x1 + delta.x,
            original.y1,
        ),
        ResizeHandle::BottomLeft => (
            original.x0 + delta.x,
            original.y0,
            original.x1,
            original.y1 + delta.y,
        ),
        ResizeHandle::BottomRight => (
            original.x0,
            original.y0,
            original.x1 + delta.x,
            original.y1 + delta.y,
        ),
    };
    let (x0, x1) = if x0 < x1 { (x0, x1) } else { (x1, x0) };
    let (y0, y1) = if y0 < y1 { (y0, y1) } else { (y1, y0) };
    Rect::new(
        x0,
        y0,
        x0 + (x1 - x0).max(MIN_RESIZE_SIZE),
        y0 + (y1 - y0).max(MIN_RESIZE_SIZE),
    )
}

/// Operation kind of an active gesture, with the pre-gesture snapshot it
/// needs to replay or revert.
#[derive(Debug, Clone)]
pub enum GestureKind {
    /// Translating every affected widget from its starting position.
    Move {
        /// Pre-gesture position per affected widget.
        origins: HashMap<WidgetId, Point>,
    },
    /// Corner-dragging a single widget.
    Resize {
        id: WidgetId,
        handle: ResizeHandle,
        original: Rect,
    },
    /// Dragging out a selection marquee; the scene is not touched.
    BoxSelect { additive: bool },
}

/// Transient state of one in-progress pointer interaction.
#[derive(Debug, Clone)]
pub struct Gesture {
    pub pointer: PointerId,
    pub start: Point,
    pub current: Point,
    pub kind: GestureKind,
}

impl Gesture {
    pub fn new(pointer: PointerId, start: Point, kind: GestureKind) -> Self {
        Self {
            pointer,
            start,
            current: start,
            kind,
        }
    }

    /// Net pointer travel since the gesture began.
    pub fn delta(&self) -> Vec2 {
        self.current - self.start
    }

    /// The marquee rectangle spanned so far.
    pub fn marquee(&self) -> Rect {
        Rect::from_points(self.start, self.current)
    }

    /// Whether pointer travel exceeds the activation threshold on either
    /// axis.
    pub fn exceeded_threshold(&self) -> bool {
        let delta = self.delta();
        delta.x.abs() > DRAG_THRESHOLD || delta.y.abs() > DRAG_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_at_corners() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(
            handle_at(rect, Point::new(2.0, -3.0), HANDLE_TOLERANCE),
            Some(ResizeHandle::TopLeft)
        );
        assert_eq!(
            handle_at(rect, Point::new(99.0, 101.0), HANDLE_TOLERANCE),
            Some(ResizeHandle::BottomRight)
        );
        assert_eq!(handle_at(rect, Point::new(50.0, 50.0), HANDLE_TOLERANCE), None);
    }

    #[test]
    fn test_resize_bottom_right_grows() {
        let rect = resize_rect(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            ResizeHandle::BottomRight,
            Vec2::new(50.0, 20.0),
        );
        assert_eq!(rect, Rect::new(0.0, 0.0, 150.0, 120.0));
    }

    #[test]
    fn test_resize_top_left_moves_origin() {
        let rect = resize_rect(
            Rect::new(10.0, 10.0, 110.0, 110.0),
            ResizeHandle::TopLeft,
            Vec2::new(-10.0, 5.0),
        );
        assert_eq!(rect, Rect::new(0.0, 15.0, 110.0, 110.0));
    }

    #[test]
    fn test_resize_normalizes_crossover() {
        // Dragging the bottom-right corner past the top-left flips axes.
        let rect = resize_rect(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            ResizeHandle::BottomRight,
            Vec2::new(-140.0, -130.0),
        );
        assert_eq!(rect, Rect::new(-40.0, -30.0, 0.0, 0.0));
    }

    #[test]
    fn test_resize_clamps_minimum() {
        let rect = resize_rect(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            ResizeHandle::BottomRight,
            Vec2::new(-100.0, -100.0),
        );
        assert!((rect.width() - MIN_RESIZE_SIZE).abs() < f64::EPSILON);
        assert!((rect.height() - MIN_RESIZE_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_threshold() {
        let mut gesture = Gesture::new(1, Point::ZERO, GestureKind::BoxSelect { additive: false });
        gesture.current = Point::new(4.0, 4.0);
        assert!(!gesture.exceeded_threshold());
        gesture.current = Point::new(4.0, 6.0);
        assert!(gesture.exceeded_threshold());
    }

    #[test]
    fn test_marquee_normalizes_direction() {
        let mut gesture = Gesture::new(1, Point::new(50.0, 50.0), GestureKind::BoxSelect { additive: false });
        gesture.current = Point::new(10.0, 20.0);
        assert_eq!(gesture.marquee(), Rect::new(10.0, 20.0, 50.0, 50.0));
    }
}
