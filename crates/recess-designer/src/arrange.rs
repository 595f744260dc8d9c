//! Alignment, distribution, and same-size operations.
//!
//! All three operate on the current selection with the reference widget as
//! the anchor and produce one command capturing every old and new position
//! or size, so the whole operation undoes atomically. Below the minimum
//! cardinality they reject with a logged warning and build nothing.

use kurbo::{Point, Size};

use crate::command::{AlignEdge, Axis, Command, SizeMode, WidgetMove, WidgetResize};
use crate::scene::Scene;
use crate::widget::WidgetId;

/// Minimum selected widgets for align and same-size.
pub const MIN_ALIGN_WIDGETS: usize = 2;
/// Minimum selected widgets for distribute.
pub const MIN_DISTRIBUTE_WIDGETS: usize = 3;

/// Resolve the raw selection into the operated set.
///
/// Groups contribute only themselves; a child of a group is dropped with a
/// warning even if its id appears in the raw selection, as are ids that no
/// longer resolve.
pub(crate) fn operated_ids(scene: &Scene, selected: &[WidgetId]) -> Vec<WidgetId> {
    let mut ops = Vec::with_capacity(selected.len());
    for id in selected {
        if !scene.contains(id) {
            log::warn!("arrange: dropping unknown widget {id}");
            continue;
        }
        if scene.is_grouped(id) {
            log::warn!("arrange: dropping grouped child {id}; its group participates instead");
            continue;
        }
        ops.push(id.clone());
    }
    ops
}

/// Moves for one widget translated to `new_origin`, carrying any group
/// children along by the same delta.
fn translation_moves(scene: &Scene, id: &WidgetId, new_origin: Point) -> Vec<WidgetMove> {
    let Some(widget) = scene.get(id) else {
        return Vec::new();
    };
    let delta = new_origin - widget.position;
    let mut moves = vec![WidgetMove {
        id: id.clone(),
        old: widget.position,
        new: new_origin,
    }];
    if let Some(group) = widget.as_group() {
        for child_id in &group.child_ids {
            if let Some(child) = scene.get(child_id) {
                moves.push(WidgetMove {
                    id: child_id.clone(),
                    old: child.position,
                    new: child.position + delta,
                });
            }
        }
    }
    moves
}

/// Build an align command, anchored on the reference widget.
pub fn align(
    scene: &Scene,
    selected: &[WidgetId],
    reference: Option<&WidgetId>,
    edge: AlignEdge,
) -> Option<Command> {
    let ops = operated_ids(scene, selected);
    if ops.len() < MIN_ALIGN_WIDGETS {
        log::warn!("arrange: align needs at least {MIN_ALIGN_WIDGETS} widgets");
        return None;
    }
    let reference = match reference {
        Some(id) if ops.contains(id) => id,
        _ => {
            log::warn!("arrange: align needs a reference widget in the selection");
            return None;
        }
    };
    let anchor = scene.get(reference)?.bounds();

    let mut moves = Vec::new();
    for id in ops.iter().filter(|id| *id != reference) {
        let widget = scene.get(id)?;
        let bounds = widget.bounds();
        let new_origin = match edge {
            AlignEdge::Left => Point::new(anchor.x0, bounds.y0),
            AlignEdge::Right => Point::new(anchor.x1 - bounds.width(), bounds.y0),
            AlignEdge::Top => Point::new(bounds.x0, anchor.y0),
            AlignEdge::Bottom => Point::new(bounds.x0, anchor.y1 - bounds.height()),
            AlignEdge::CenterHorizontal => Point::new(
                anchor.x0 + (anchor.width() - bounds.width()) / 2.0,
                bounds.y0,
            ),
            AlignEdge::CenterVertical => Point::new(
                bounds.x0,
                anchor.y0 + (anchor.height() - bounds.height()) / 2.0,
            ),
        };
        if (new_origin - widget.position).hypot2() > 0.0 {
            moves.extend(translation_moves(scene, id, new_origin));
        }
    }
    if moves.is_empty() {
        log::debug!("arrange: selection already aligned {edge:?}");
        return None;
    }
    Some(Command::Align { edge, moves })
}

/// Build a distribute command: the first and last widget along the axis
/// stay fixed and the interior widgets are spaced so the gaps between
/// successive edges are equal.
pub fn distribute(scene: &Scene, selected: &[WidgetId], axis: Axis) -> Option<Command> {
    let ops = operated_ids(scene, selected);
    if ops.len() < MIN_DISTRIBUTE_WIDGETS {
        log::warn!("arrange: distribute needs at least {MIN_DISTRIBUTE_WIDGETS} widgets");
        return None;
    }

    let mut entries: Vec<(WidgetId, kurbo::Rect)> = ops
        .iter()
        .filter_map(|id| scene.get(id).map(|w| (id.clone(), w.bounds())))
        .collect();
    entries.sort_by(|(_, a), (_, b)| {
        let (a, b) = match axis {
            Axis::Horizontal => (a.x0, b.x0),
            Axis::Vertical => (a.y0, b.y0),
        };
        a.total_cmp(&b)
    });

    let extent = |rect: &kurbo::Rect| match axis {
        Axis::Horizontal => rect.width(),
        Axis::Vertical => rect.height(),
    };
    let leading = |rect: &kurbo::Rect| match axis {
        Axis::Horizontal => rect.x0,
        Axis::Vertical => rect.y0,
    };

    let first = &entries[0].1;
    let last = &entries[entries.len() - 1].1;
    let span = leading(last) + extent(last) - leading(first);
    let total: f64 = entries.iter().map(|(_, rect)| extent(rect)).sum();
    let gap = (span - total) / (entries.len() - 1) as f64;

    let mut moves = Vec::new();
    let mut cursor = leading(first) + extent(first);
    for (id, rect) in &entries[1..entries.len() - 1] {
        let new_leading = cursor + gap;
        cursor = new_leading + extent(rect);
        if (new_leading - leading(rect)).abs() > 0.0 {
            let new_origin = match axis {
                Axis::Horizontal => Point::new(new_leading, rect.y0),
                Axis::Vertical => Point::new(rect.x0, new_leading),
            };
            moves.extend(translation_moves(scene, id, new_origin));
        }
    }
    if moves.is_empty() {
        log::debug!("arrange: selection already distributed {axis:?}");
        return None;
    }
    Some(Command::Distribute { axis, moves })
}

/// Build a same-size command copying the reference's dimensions onto every
/// other operated widget. Groups are move-only and skipped as targets.
pub fn same_size(
    scene: &Scene,
    selected: &[WidgetId],
    reference: Option<&WidgetId>,
    mode: SizeMode,
) -> Option<Command> {
    let ops = operated_ids(scene, selected);
    if ops.len() < MIN_ALIGN_WIDGETS {
        log::warn!("arrange: same-size needs at least {MIN_ALIGN_WIDGETS} widgets");
        return None;
    }
    let reference = match reference {
        Some(id) if ops.contains(id) => id,
        _ => {
            log::warn!("arrange: same-size needs a reference widget in the selection");
            return None;
        }
    };
    let anchor = scene.get(reference)?.size;

    let mut resizes = Vec::new();
    for id in ops.iter().filter(|id| *id != reference) {
        let widget = scene.get(id)?;
        if widget.is_group() {
            log::warn!("arrange: skipping group {id}; groups cannot be resized");
            continue;
        }
        let new = match mode {
            SizeMode::Width => Size::new(anchor.width, widget.size.height),
            SizeMode::Height => Size::new(widget.size.width, anchor.height),
            SizeMode::Both => anchor,
        };
        if new != widget.size {
            resizes.push(WidgetResize {
                id: id.clone(),
                old: widget.size,
                new,
            });
        }
    }
    if resizes.is_empty() {
        log::debug!("arrange: selection already matches reference {mode:?}");
        return None;
    }
    Some(Command::SameSize { mode, resizes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{Widget, WidgetKind};

    fn boxed(id: &str, x: f64, y: f64, w: f64, h: f64) -> Widget {
        let mut widget = Widget::new(WidgetKind::Box, Point::new(x, y), Size::new(w, h));
        widget.id = id.to_string();
        widget
    }

    fn apply(scene: &mut Scene, command: Command) {
        command.execute(scene).unwrap();
    }

    #[test]
    fn test_align_left_to_reference() {
        // Widget A (reference) at (10,10,100,100), widget B at (40,40,50,50):
        // align-left sets B.x = 10, B.y unchanged.
        let mut scene = Scene::new();
        scene.add_widget(boxed("w1", 10.0, 10.0, 100.0, 100.0));
        scene.add_widget(boxed("w2", 40.0, 40.0, 50.0, 50.0));
        let selected = vec!["w1".to_string(), "w2".to_string()];

        let command = align(&scene, &selected, Some(&"w1".to_string()), AlignEdge::Left).unwrap();
        apply(&mut scene, command);

        let b = scene.get("w2").unwrap();
        assert!((b.position.x - 10.0).abs() < f64::EPSILON);
        assert!((b.position.y - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_align_is_idempotent() {
        let mut scene = Scene::new();
        scene.add_widget(boxed("w1", 10.0, 10.0, 100.0, 100.0));
        scene.add_widget(boxed("w2", 40.0, 40.0, 50.0, 50.0));
        let selected = vec!["w1".to_string(), "w2".to_string()];

        let command = align(&scene, &selected, Some(&"w1".to_string()), AlignEdge::Left).unwrap();
        apply(&mut scene, command);
        // A second pass finds nothing left to move.
        assert!(align(&scene, &selected, Some(&"w1".to_string()), AlignEdge::Left).is_none());
    }

    #[test]
    fn test_align_center_within_reference_span() {
        let mut scene = Scene::new();
        scene.add_widget(boxed("w1", 0.0, 0.0, 100.0, 100.0));
        scene.add_widget(boxed("w2", 300.0, 300.0, 40.0, 20.0));
        let selected = vec!["w1".to_string(), "w2".to_string()];

        let command = align(
            &scene,
            &selected,
            Some(&"w1".to_string()),
            AlignEdge::CenterHorizontal,
        )
        .unwrap();
        apply(&mut scene, command);
        let b = scene.get("w2").unwrap();
        assert!((b.position.x - 30.0).abs() < f64::EPSILON);
        assert!((b.position.y - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_align_rejects_below_minimum() {
        let mut scene = Scene::new();
        scene.add_widget(boxed("w1", 0.0, 0.0, 10.0, 10.0));
        let selected = vec!["w1".to_string()];
        assert!(align(&scene, &selected, Some(&"w1".to_string()), AlignEdge::Left).is_none());
    }

    #[test]
    fn test_distribute_three_widgets_horizontally() {
        // Widgets at x = 0, 50, 200, each 50 wide: span 250, sizes 150,
        // gap = (250 - 150) / 2 = 50, middle lands at x = 100.
        let mut scene = Scene::new();
        scene.add_widget(boxed("a", 0.0, 0.0, 50.0, 50.0));
        scene.add_widget(boxed("b", 50.0, 0.0, 50.0, 50.0));
        scene.add_widget(boxed("c", 200.0, 0.0, 50.0, 50.0));
        let selected = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let command = distribute(&scene, &selected, Axis::Horizontal).unwrap();
        apply(&mut scene, command);

        assert!((scene.get("a").unwrap().position.x - 0.0).abs() < f64::EPSILON);
        assert!((scene.get("b").unwrap().position.x - 100.0).abs() < f64::EPSILON);
        assert!((scene.get("c").unwrap().position.x - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distribute_holds_ends_fixed_vertically() {
        let mut scene = Scene::new();
        scene.add_widget(boxed("a", 0.0, 0.0, 10.0, 20.0));
        scene.add_widget(boxed("b", 0.0, 25.0, 10.0, 20.0));
        scene.add_widget(boxed("c", 0.0, 60.0, 10.0, 20.0));
        scene.add_widget(boxed("d", 0.0, 180.0, 10.0, 20.0));
        let selected: Vec<String> =
            ["a", "b", "c", "d"].iter().map(ToString::to_string).collect();

        let command = distribute(&scene, &selected, Axis::Vertical).unwrap();
        apply(&mut scene, command);

        // span 200, sizes 80, gap = 120 / 3 = 40.
        assert!((scene.get("a").unwrap().position.y - 0.0).abs() < f64::EPSILON);
        assert!((scene.get("b").unwrap().position.y - 60.0).abs() < f64::EPSILON);
        assert!((scene.get("c").unwrap().position.y - 120.0).abs() < f64::EPSILON);
        assert!((scene.get("d").unwrap().position.y - 180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distribute_rejects_two_widgets() {
        let mut scene = Scene::new();
        scene.add_widget(boxed("a", 0.0, 0.0, 10.0, 10.0));
        scene.add_widget(boxed("b", 50.0, 0.0, 10.0, 10.0));
        let selected = vec!["a".to_string(), "b".to_string()];
        assert!(distribute(&scene, &selected, Axis::Horizontal).is_none());
    }

    #[test]
    fn test_same_size_width_only() {
        let mut scene = Scene::new();
        scene.add_widget(boxed("w1", 0.0, 0.0, 120.0, 80.0));
        scene.add_widget(boxed("w2", 200.0, 0.0, 50.0, 30.0));
        let selected = vec!["w1".to_string(), "w2".to_string()];

        let command =
            same_size(&scene, &selected, Some(&"w1".to_string()), SizeMode::Width).unwrap();
        apply(&mut scene, command);

        let b = scene.get("w2").unwrap();
        assert!((b.size.width - 120.0).abs() < f64::EPSILON);
        // Height untouched.
        assert!((b.size.height - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_same_size_both_from_reference() {
        let mut scene = Scene::new();
        scene.add_widget(boxed("w1", 0.0, 0.0, 120.0, 80.0));
        scene.add_widget(boxed("w2", 200.0, 0.0, 50.0, 30.0));
        let selected = vec!["w2".to_string(), "w1".to_string()];

        // w2 is the reference; w1 shrinks to match.
        let command =
            same_size(&scene, &selected, Some(&"w2".to_string()), SizeMode::Both).unwrap();
        apply(&mut scene, command);
        let a = scene.get("w1").unwrap();
        assert!((a.size.width - 50.0).abs() < f64::EPSILON);
        assert!((a.size.height - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grouped_children_dropped_from_operated_set() {
        use crate::widget::GroupData;

        let mut scene = Scene::new();
        scene.add_widget(boxed("a", 0.0, 0.0, 10.0, 10.0));
        scene.add_widget(boxed("b", 50.0, 0.0, 10.0, 10.0));
        let mut group = Widget::new(
            WidgetKind::Group(GroupData {
                child_ids: vec!["a".to_string()],
                child_z: vec![0],
            }),
            Point::ZERO,
            Size::new(100.0, 100.0),
        );
        group.id = "g".to_string();
        scene.add_widget(group);

        // The raw selection names a grouped child directly.
        let selected = vec!["a".to_string(), "b".to_string(), "g".to_string()];
        let ops = operated_ids(&scene, &selected);
        assert_eq!(ops, vec!["b".to_string(), "g".to_string()]);
    }

    #[test]
    fn test_aligning_a_group_carries_its_children() {
        use crate::widget::GroupData;

        let mut scene = Scene::new();
        scene.add_widget(boxed("a", 100.0, 100.0, 20.0, 20.0));
        let mut group = Widget::new(
            WidgetKind::Group(GroupData {
                child_ids: vec!["a".to_string()],
                child_z: vec![0],
            }),
            Point::new(90.0, 90.0),
            Size::new(110.0, 110.0),
        );
        group.id = "g".to_string();
        scene.add_widget(group);
        scene.add_widget(boxed("anchor", 0.0, 0.0, 40.0, 40.0));

        let selected = vec!["anchor".to_string(), "g".to_string()];
        let command =
            align(&scene, &selected, Some(&"anchor".to_string()), AlignEdge::Left).unwrap();
        apply(&mut scene, command);

        // The group snapped to x = 0 and dragged its child along.
        assert!((scene.get("g").unwrap().position.x - 0.0).abs() < f64::EPSILON);
        assert!((scene.get("a").unwrap().position.x - 10.0).abs() < f64::EPSILON);
    }
}
