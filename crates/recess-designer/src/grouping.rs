//! Grouping and ungrouping of widget selections.
//!
//! A group is an ordinary widget whose kind carries the ordered child ids
//! and their z-indices captured at creation time. While grouped, children
//! stay independently rendered but are skipped by hit-testing; the group's
//! rect is fixed at creation and does not follow later child moves.

use kurbo::{Rect, Size};

use crate::arrange::operated_ids;
use crate::command::Command;
use crate::scene::Scene;
use crate::widget::{GroupData, Widget, WidgetId, WidgetKind};

/// Padding around the children's union rect.
pub const GROUP_PADDING: f64 = 10.0;
/// Minimum group rect dimension; smaller rects are expanded around their
/// center.
pub const GROUP_MIN_SIZE: f64 = 100.0;
/// Minimum widgets required to form a group.
pub const MIN_GROUP_WIDGETS: usize = 2;

/// The rect a group of the given child bounds would occupy: padded union,
/// expanded to the minimum size centered on its own center.
pub fn group_rect(children: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    let mut iter = children.into_iter();
    let first = iter.next()?;
    let union = iter.fold(first, |acc, rect| acc.union(rect));
    let padded = union.inflate(GROUP_PADDING, GROUP_PADDING);
    Some(Rect::from_center_size(
        padded.center(),
        Size::new(
            padded.width().max(GROUP_MIN_SIZE),
            padded.height().max(GROUP_MIN_SIZE),
        ),
    ))
}

/// Build a group command for the current selection.
///
/// Rejected (logged, `None`) when fewer than two widgets remain after
/// resolving the selection, or when any of them is itself a group: groups
/// do not nest.
pub fn build_group(scene: &Scene, selected: &[WidgetId]) -> Option<Command> {
    let ops = operated_ids(scene, selected);
    if ops.len() < MIN_GROUP_WIDGETS {
        log::warn!("grouping: need at least {MIN_GROUP_WIDGETS} widgets to group");
        return None;
    }
    if let Some(nested) = ops.iter().find(|id| scene.get(id).is_some_and(Widget::is_group)) {
        log::warn!("grouping: {nested} is already a group; groups do not nest");
        return None;
    }

    let rect = group_rect(ops.iter().filter_map(|id| scene.get(id).map(Widget::bounds)))?;
    let child_z: Vec<i64> = ops
        .iter()
        .filter_map(|id| scene.get(id).map(|w| w.z_index))
        .collect();
    // Above the children's maximum by the total widget count, which keeps
    // the group visible above everything without renumbering the scene.
    let max_child_z = child_z.iter().copied().max().unwrap_or(0);
    let z_index = max_child_z + scene.len() as i64;

    let mut group = Widget::new(
        WidgetKind::Group(GroupData {
            child_ids: ops,
            child_z,
        }),
        rect.origin(),
        rect.size(),
    );
    group.z_index = z_index;
    Some(Command::Group { group })
}

/// Build the exact inverse of grouping for one group widget: remove it,
/// restore the children's captured z-indices and interactivity.
pub fn build_ungroup(scene: &Scene, group_id: &WidgetId) -> Option<Command> {
    let Some(widget) = scene.get(group_id) else {
        log::warn!("grouping: cannot ungroup unknown widget {group_id}");
        return None;
    };
    if !widget.is_group() {
        log::warn!("grouping: {group_id} is not a group");
        return None;
    }
    Some(Command::Ungroup {
        group: widget.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn boxed(id: &str, x: f64, y: f64, w: f64, h: f64) -> Widget {
        let mut widget = Widget::new(WidgetKind::Box, Point::new(x, y), Size::new(w, h));
        widget.id = id.to_string();
        widget
    }

    #[test]
    fn test_group_rect_pads_and_enforces_minimum() {
        // Union (10,10)-(130,60) -> padded (0,0)-(140,70); height expands
        // to the 100 minimum around the center.
        let rect = group_rect([
            Rect::new(10.0, 10.0, 60.0, 60.0),
            Rect::new(80.0, 20.0, 130.0, 50.0),
        ])
        .unwrap();
        assert!((rect.width() - 140.0).abs() < f64::EPSILON);
        assert!((rect.height() - 100.0).abs() < f64::EPSILON);
        assert!((rect.center().y - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_group_captures_children_and_z() {
        let mut scene = Scene::new();
        let mut w1 = boxed("w1", 10.0, 10.0, 100.0, 100.0);
        w1.z_index = scene.allocate_z();
        let mut w2 = boxed("w2", 40.0, 40.0, 50.0, 50.0);
        w2.z_index = scene.allocate_z();
        scene.add_widget(w1);
        scene.add_widget(w2);

        let selected = vec!["w1".to_string(), "w2".to_string()];
        let command = build_group(&scene, &selected).unwrap();
        let Command::Group { group } = &command else {
            panic!("expected a group command");
        };

        let data = group.as_group().unwrap();
        assert_eq!(data.child_ids, vec!["w1".to_string(), "w2".to_string()]);
        assert_eq!(data.child_z, vec![0, 1]);
        assert!(group.bounds().width() >= GROUP_MIN_SIZE);
        assert!(group.bounds().height() >= GROUP_MIN_SIZE);
        // Above the children's maximum by the widget count.
        assert_eq!(group.z_index, 1 + 2);
    }

    #[test]
    fn test_group_rejects_single_widget_and_nesting() {
        let mut scene = Scene::new();
        scene.add_widget(boxed("a", 0.0, 0.0, 10.0, 10.0));
        assert!(build_group(&scene, &["a".to_string()]).is_none());

        scene.add_widget(boxed("b", 30.0, 0.0, 10.0, 10.0));
        let command = build_group(&scene, &["a".to_string(), "b".to_string()]).unwrap();
        command.execute(&mut scene).unwrap();
        let group_id = scene
            .widgets()
            .find(|w| w.is_group())
            .map(|w| w.id.clone())
            .unwrap();

        // The new group plus another widget cannot be grouped again.
        scene.add_widget(boxed("c", 60.0, 0.0, 10.0, 10.0));
        assert!(build_group(&scene, &[group_id, "c".to_string()]).is_none());
    }

    #[test]
    fn test_group_ungroup_round_trip_restores_children() {
        let mut scene = Scene::new();
        let mut w1 = boxed("w1", 10.0, 10.0, 100.0, 100.0);
        w1.z_index = scene.allocate_z();
        let mut w2 = boxed("w2", 40.0, 40.0, 50.0, 50.0);
        w2.z_index = scene.allocate_z();
        scene.add_widget(w1.clone());
        scene.add_widget(w2.clone());

        let selected = vec!["w1".to_string(), "w2".to_string()];
        let group_cmd = build_group(&scene, &selected).unwrap();
        group_cmd.execute(&mut scene).unwrap();

        let group_id = scene
            .widgets()
            .find(|w| w.is_group())
            .map(|w| w.id.clone())
            .unwrap();
        assert!(scene.is_grouped("w1"));
        assert!(scene.is_grouped("w2"));

        let ungroup_cmd = build_ungroup(&scene, &group_id).unwrap();
        ungroup_cmd.execute(&mut scene).unwrap();

        assert!(scene.get(&group_id).is_none());
        assert!(!scene.is_grouped("w1"));
        assert!(!scene.is_grouped("w2"));
        assert_eq!(scene.get("w1"), Some(&w1));
        assert_eq!(scene.get("w2"), Some(&w2));
    }

    #[test]
    fn test_ungroup_rejects_non_groups() {
        let mut scene = Scene::new();
        scene.add_widget(boxed("a", 0.0, 0.0, 10.0, 10.0));
        assert!(build_ungroup(&scene, &"a".to_string()).is_none());
        assert!(build_ungroup(&scene, &"ghost".to_string()).is_none());
    }
}
