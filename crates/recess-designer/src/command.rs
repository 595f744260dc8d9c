//! Reversible scene mutations, the sole unit of undo/redo granularity.
//!
//! Every variant captures full before/after state so it can be replayed in
//! either direction without consulting the live scene beyond the ids it
//! targets. Validation happens before any mutation, so a failing command
//! leaves the scene as it found it.

use kurbo::{Point, Size};
use thiserror::Error;

use crate::scene::Scene;
use crate::widget::{Widget, WidgetId};

/// Command execution/undo errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A widget the command targets no longer exists in the scene.
    #[error("widget not found: {0}")]
    WidgetNotFound(WidgetId),
    /// A group command targeted a widget that is not a group.
    #[error("widget is not a group: {0}")]
    NotAGroup(WidgetId),
}

/// Alignment edges; the reference widget is the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignEdge {
    Left,
    Right,
    Top,
    Bottom,
    /// Center within the reference's horizontal span.
    CenterHorizontal,
    /// Center within the reference's vertical span.
    CenterVertical,
}

impl AlignEdge {
    fn label(self) -> &'static str {
        match self {
            AlignEdge::Left => "left",
            AlignEdge::Right => "right",
            AlignEdge::Top => "top",
            AlignEdge::Bottom => "bottom",
            AlignEdge::CenterHorizontal => "center",
            AlignEdge::CenterVertical => "middle",
        }
    }
}

/// Distribution axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    fn label(self) -> &'static str {
        match self {
            Axis::Horizontal => "horizontally",
            Axis::Vertical => "vertically",
        }
    }
}

/// Which dimensions a same-size command copies from the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    Width,
    Height,
    Both,
}

impl SizeMode {
    fn label(self) -> &'static str {
        match self {
            SizeMode::Width => "width",
            SizeMode::Height => "height",
            SizeMode::Both => "size",
        }
    }
}

/// One widget's recorded translation.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetMove {
    pub id: WidgetId,
    pub old: Point,
    pub new: Point,
}

/// One widget's recorded size change.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetResize {
    pub id: WidgetId,
    pub old: Size,
    pub new: Size,
}

/// One widget's recorded z-index change.
#[derive(Debug, Clone, PartialEq)]
pub struct ZChange {
    pub id: WidgetId,
    pub old: i64,
    pub new: i64,
}

/// An atomic, reversible scene mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Translate widgets from recorded old to new positions.
    Move { moves: Vec<WidgetMove> },
    /// Reposition and resize a single widget.
    Resize {
        id: WidgetId,
        old_position: Point,
        old_size: Size,
        new_position: Point,
        new_size: Size,
    },
    /// Insert widget snapshots into the scene.
    Create { widgets: Vec<Widget> },
    /// Remove widgets, keeping full snapshots for undo.
    Delete { widgets: Vec<Widget> },
    /// Reposition widgets to satisfy an alignment edge.
    Align { edge: AlignEdge, moves: Vec<WidgetMove> },
    /// Reposition widgets to equalize gaps along an axis.
    Distribute { axis: Axis, moves: Vec<WidgetMove> },
    /// Copy reference dimensions onto widgets.
    SameSize { mode: SizeMode, resizes: Vec<WidgetResize> },
    /// Reassign z-indices.
    ChangeZOrder { changes: Vec<ZChange> },
    /// Collapse widgets into a new group widget.
    Group { group: Widget },
    /// Dissolve a group, restoring the children's captured z-indices.
    Ungroup { group: Widget },
}

impl Command {
    /// Apply the forward mutation.
    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        match self {
            Command::Move { moves } | Command::Align { moves, .. } | Command::Distribute { moves, .. } => {
                ensure_exist(scene, moves.iter().map(|m| &m.id))?;
                for m in moves {
                    scene.set_position(&m.id, m.new);
                }
                Ok(())
            }
            Command::Resize {
                id,
                new_position,
                new_size,
                ..
            } => {
                ensure_exist(scene, std::iter::once(id))?;
                scene.set_position(id, *new_position);
                scene.set_size(id, *new_size);
                Ok(())
            }
            Command::Create { widgets } => {
                for widget in widgets {
                    scene.add_widget(widget.clone());
                }
                Ok(())
            }
            Command::Delete { widgets } => {
                ensure_exist(scene, widgets.iter().map(|w| &w.id))?;
                for widget in widgets {
                    scene.remove_widget(&widget.id);
                }
                Ok(())
            }
            Command::SameSize { resizes, .. } => {
                ensure_exist(scene, resizes.iter().map(|r| &r.id))?;
                for r in resizes {
                    scene.set_size(&r.id, r.new);
                }
                Ok(())
            }
            Command::ChangeZOrder { changes } => {
                ensure_exist(scene, changes.iter().map(|c| &c.id))?;
                for c in changes {
                    scene.set_z_index(&c.id, c.new);
                }
                Ok(())
            }
            Command::Group { group } => {
                let data = group
                    .as_group()
                    .ok_or_else(|| CommandError::NotAGroup(group.id.clone()))?;
                ensure_exist(scene, data.child_ids.iter())?;
                scene.add_widget(group.clone());
                Ok(())
            }
            Command::Ungroup { group } => {
                let data = group
                    .as_group()
                    .ok_or_else(|| CommandError::NotAGroup(group.id.clone()))?;
                if scene.remove_widget(&group.id).is_none() {
                    return Err(CommandError::WidgetNotFound(group.id.clone()));
                }
                for (index, child) in data.child_ids.iter().enumerate() {
                    if let Some(z) = data.child_z.get(index) {
                        scene.set_z_index(child, *z);
                    }
                }
                Ok(())
            }
        }
    }

    /// Apply the inverse mutation.
    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        match self {
            Command::Move { moves } | Command::Align { moves, .. } | Command::Distribute { moves, .. } => {
                ensure_exist(scene, moves.iter().map(|m| &m.id))?;
                for m in moves {
                    scene.set_position(&m.id, m.old);
                }
                Ok(())
            }
            Command::Resize {
                id,
                old_position,
                old_size,
                ..
            } => {
                ensure_exist(scene, std::iter::once(id))?;
                scene.set_position(id, *old_position);
                scene.set_size(id, *old_size);
                Ok(())
            }
            Command::Create { widgets } => {
                ensure_exist(scene, widgets.iter().map(|w| &w.id))?;
                for widget in widgets {
                    scene.remove_widget(&widget.id);
                }
                Ok(())
            }
            Command::Delete { widgets } => {
                for widget in widgets {
                    scene.add_widget(widget.clone());
                }
                Ok(())
            }
            Command::SameSize { resizes, .. } => {
                ensure_exist(scene, resizes.iter().map(|r| &r.id))?;
                for r in resizes {
                    scene.set_size(&r.id, r.old);
                }
                Ok(())
            }
            Command::ChangeZOrder { changes } => {
                ensure_exist(scene, changes.iter().map(|c| &c.id))?;
                for c in changes {
                    scene.set_z_index(&c.id, c.old);
                }
                Ok(())
            }
            Command::Group { group } => {
                if scene.remove_widget(&group.id).is_none() {
                    return Err(CommandError::WidgetNotFound(group.id.clone()));
                }
                Ok(())
            }
            Command::Ungroup { group } => {
                let data = group
                    .as_group()
                    .ok_or_else(|| CommandError::NotAGroup(group.id.clone()))?;
                ensure_exist(scene, data.child_ids.iter())?;
                scene.add_widget(group.clone());
                Ok(())
            }
        }
    }

    /// Human-readable label for menus and logs.
    pub fn description(&self) -> String {
        match self {
            Command::Move { moves } => format!("Move {}", count_label(moves.len())),
            Command::Resize { .. } => "Resize widget".to_string(),
            Command::Create { widgets } => format!("Create {}", count_label(widgets.len())),
            Command::Delete { widgets } => format!("Delete {}", count_label(widgets.len())),
            Command::Align { edge, .. } => format!("Align {}", edge.label()),
            Command::Distribute { axis, .. } => format!("Distribute {}", axis.label()),
            Command::SameSize { mode, .. } => format!("Match {}", mode.label()),
            Command::ChangeZOrder { changes } => {
                format!("Reorder {}", count_label(changes.len()))
            }
            Command::Group { group } => {
                let children = group.as_group().map_or(0, |g| g.child_ids.len());
                format!("Group {}", count_label(children))
            }
            Command::Ungroup { .. } => "Ungroup".to_string(),
        }
    }
}

fn count_label(count: usize) -> String {
    if count == 1 {
        "widget".to_string()
    } else {
        format!("{count} widgets")
    }
}

fn ensure_exist<'a>(
    scene: &Scene,
    ids: impl Iterator<Item = &'a WidgetId>,
) -> Result<(), CommandError> {
    for id in ids {
        if !scene.contains(id) {
            return Err(CommandError::WidgetNotFound(id.clone()));
        }
    }
    Ok(())
}
