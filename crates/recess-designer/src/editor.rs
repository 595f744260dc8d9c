//! Editor facade.
//!
//! One editor instance owns the scene, selection, history, clipboard and
//! the active gesture; all mutation happens synchronously on the event
//! callback that triggered it, so nothing here needs locking. Scene changes
//! that should be undoable go through [`CommandHistory`]; live gesture
//! feedback writes the scene directly and is reconciled into a single
//! command on pointer-up.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use kurbo::{Point, Rect, Size, Vec2};
use serde_json::{Map, Value};

use crate::arrange;
use crate::clipboard::Clipboard;
use crate::command::{AlignEdge, Axis, Command, CommandError, SizeMode, WidgetMove, ZChange};
use crate::document::{DocumentError, LayoutDocument};
use crate::gesture::{
    handle_at, resize_rect, Gesture, GestureKind, PointerId, ResizeHandle, HANDLE_TOLERANCE,
};
use crate::grouping;
use crate::history::{CommandHistory, HistoryStatus};
use crate::scene::Scene;
use crate::selection::SelectionManager;
use crate::widget::{generate_id, Widget, WidgetId, WidgetKind};

/// Offset applied to pasted and duplicated widgets so they do not land
/// exactly on their source.
const PASTE_OFFSET: Vec2 = Vec2::new(16.0, 16.0);

/// Structured notifications delivered to the host-registered observer.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Undo/redo availability changed; refresh button enablement.
    HistoryChanged { can_undo: bool, can_redo: bool },
    /// Selection membership or the reference widget changed.
    SelectionChanged {
        selected: Vec<WidgetId>,
        reference: Option<WidgetId>,
    },
    /// The scene was mutated; the visual layer should repaint.
    SceneChanged,
    /// A document replaced the scene wholesale.
    DocumentLoaded,
    /// A routine invalid operation was rejected (never a hard error).
    OperationRejected { reason: String },
}

type EventQueue = Rc<RefCell<Vec<EditorEvent>>>;
type Observer = Box<dyn FnMut(&EditorEvent)>;

/// The designer's interaction and command engine.
pub struct Editor {
    scene: Scene,
    selection: SelectionManager,
    history: CommandHistory,
    clipboard: Clipboard,
    gesture: Option<Gesture>,
    dirty: bool,
    queue: EventQueue,
    observer: Option<Observer>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Create an editor over an empty scene.
    pub fn new() -> Self {
        let queue: EventQueue = Rc::default();

        let mut history = CommandHistory::new();
        let sink = Rc::clone(&queue);
        history.set_change_listener(move |status: HistoryStatus| {
            sink.borrow_mut().push(EditorEvent::HistoryChanged {
                can_undo: status.can_undo,
                can_redo: status.can_redo,
            });
        });

        let mut selection = SelectionManager::new();
        let sink = Rc::clone(&queue);
        selection.set_change_listener(move |selected, reference| {
            sink.borrow_mut().push(EditorEvent::SelectionChanged {
                selected: selected.to_vec(),
                reference: reference.cloned(),
            });
        });

        Self {
            scene: Scene::new(),
            selection,
            history,
            clipboard: Clipboard::new(),
            gesture: None,
            dirty: false,
            queue,
            observer: None,
        }
    }

    /// Register the host observer. Queued notifications are delivered
    /// immediately.
    pub fn set_observer(&mut self, observer: impl FnMut(&EditorEvent) + 'static) {
        self.observer = Some(Box::new(observer));
        self.flush();
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.scene.get(id)
    }

    pub fn selected_ids(&self) -> &[WidgetId] {
        self.selection.selected()
    }

    pub fn reference_id(&self) -> Option<&WidgetId> {
        self.selection.reference()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Flag a change made outside the command path (e.g. a property edited
    /// in the host's panel).
    pub fn mark_changed(&mut self) {
        self.dirty = true;
    }

    /// The active box-select marquee, for the host to draw.
    pub fn marquee(&self) -> Option<Rect> {
        match &self.gesture {
            Some(gesture) if matches!(gesture.kind, GestureKind::BoxSelect { .. }) => {
                Some(gesture.marquee())
            }
            _ => None,
        }
    }

    // ----- widget lifecycle -------------------------------------------------

    /// Create a widget as an undoable command; the new widget becomes the
    /// selection.
    pub fn add_widget(
        &mut self,
        kind: WidgetKind,
        position: Point,
        size: Size,
        properties: Map<String, Value>,
    ) -> Result<WidgetId, CommandError> {
        let mut widget = Widget::new(kind, position, size);
        widget.z_index = self.scene.allocate_z();
        widget.properties = properties;
        let id = widget.id.clone();
        self.submit(Command::Create {
            widgets: vec![widget],
        })?;
        self.selection.select(id.clone(), false);
        self.flush();
        Ok(id)
    }

    /// Delete the selection (group children included) as one command.
    pub fn delete_selected(&mut self) -> Result<bool, CommandError> {
        let widgets = self.selection_snapshots();
        if widgets.is_empty() {
            log::debug!("editor: delete with empty selection");
            return Ok(false);
        }
        self.submit(Command::Delete { widgets })?;
        self.prune_selection();
        self.flush();
        Ok(true)
    }

    // ----- history ----------------------------------------------------------

    pub fn undo(&mut self) -> Result<bool, CommandError> {
        let changed = self.history.undo(&mut self.scene)?;
        if changed {
            self.dirty = true;
            self.prune_selection();
            self.queue.borrow_mut().push(EditorEvent::SceneChanged);
        }
        self.flush();
        Ok(changed)
    }

    pub fn redo(&mut self) -> Result<bool, CommandError> {
        let changed = self.history.redo(&mut self.scene)?;
        if changed {
            self.dirty = true;
            self.prune_selection();
            self.queue.borrow_mut().push(EditorEvent::SceneChanged);
        }
        self.flush();
        Ok(changed)
    }

    // ----- selection --------------------------------------------------------

    pub fn select_widget(&mut self, id: &str, additive: bool) {
        if !self.scene.contains(id) {
            log::warn!("editor: cannot select unknown widget {id}");
            return;
        }
        if self.scene.is_grouped(id) {
            log::warn!("editor: cannot select grouped child {id}");
            return;
        }
        self.selection.select(id.to_string(), additive);
        self.flush();
    }

    pub fn deselect_widget(&mut self, id: &str) {
        self.selection.deselect(id);
        self.flush();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.flush();
    }

    pub fn set_reference(&mut self, id: &str) {
        self.selection.set_reference(id);
        self.flush();
    }

    /// Select every interactive widget (grouped children excluded).
    pub fn select_all(&mut self) {
        let ids: Vec<WidgetId> = self
            .scene
            .widgets()
            .filter(|widget| !self.scene.is_grouped(&widget.id))
            .map(|widget| widget.id.clone())
            .collect();
        self.selection.select_many(ids, false);
        self.flush();
    }

    // ----- clipboard --------------------------------------------------------

    /// Copy the selection (group children included) to the clipboard.
    pub fn copy_selected(&mut self) -> bool {
        let widgets = self.selection_snapshots();
        if widgets.is_empty() {
            return false;
        }
        self.clipboard.copy(widgets);
        true
    }

    /// Copy the selection and delete it as one command.
    pub fn cut_selected(&mut self) -> Result<bool, CommandError> {
        let widgets = self.selection_snapshots();
        if widgets.is_empty() {
            return Ok(false);
        }
        self.clipboard.cut(widgets.clone());
        self.submit(Command::Delete { widgets })?;
        self.prune_selection();
        self.flush();
        Ok(true)
    }

    /// Insert fresh copies of the clipboard content. Ids are regenerated
    /// and group child lists remapped, so pasting never collides with live
    /// widgets; the pasted top-level widgets become the selection.
    pub fn paste(&mut self) -> Result<Vec<WidgetId>, CommandError> {
        if self.clipboard.is_empty() {
            log::debug!("editor: paste with empty clipboard");
            return Ok(Vec::new());
        }
        let snapshots = self.clipboard.paste();
        self.insert_snapshots(snapshots)
    }

    /// Copy-and-paste in one step, leaving the clipboard untouched.
    pub fn duplicate_selected(&mut self) -> Result<Vec<WidgetId>, CommandError> {
        let mut snapshots = self.selection_snapshots();
        if snapshots.is_empty() {
            return Ok(Vec::new());
        }
        snapshots.sort_by_key(Widget::is_group);
        self.insert_snapshots(snapshots)
    }

    // ----- arrangement ------------------------------------------------------

    pub fn align_selected(&mut self, edge: AlignEdge) -> Result<bool, CommandError> {
        match arrange::align(
            &self.scene,
            self.selection.selected(),
            self.selection.reference(),
            edge,
        ) {
            Some(command) => {
                self.submit(command)?;
                self.flush();
                Ok(true)
            }
            None => {
                self.reject(format!("nothing to align {edge:?}"));
                Ok(false)
            }
        }
    }

    pub fn distribute_selected(&mut self, axis: Axis) -> Result<bool, CommandError> {
        match arrange::distribute(&self.scene, self.selection.selected(), axis) {
            Some(command) => {
                self.submit(command)?;
                self.flush();
                Ok(true)
            }
            None => {
                self.reject(format!("nothing to distribute {axis:?}"));
                Ok(false)
            }
        }
    }

    pub fn same_size_selected(&mut self, mode: SizeMode) -> Result<bool, CommandError> {
        match arrange::same_size(
            &self.scene,
            self.selection.selected(),
            self.selection.reference(),
            mode,
        ) {
            Some(command) => {
                self.submit(command)?;
                self.flush();
                Ok(true)
            }
            None => {
                self.reject(format!("nothing to resize to {mode:?}"));
                Ok(false)
            }
        }
    }

    /// Translate the selection by a key-driven delta as one command.
    pub fn nudge_selected(&mut self, delta: Vec2) -> Result<bool, CommandError> {
        let moves: Vec<WidgetMove> = self
            .move_set()
            .into_iter()
            .filter_map(|id| {
                self.scene.get(&id).map(|widget| WidgetMove {
                    id,
                    old: widget.position,
                    new: widget.position + delta,
                })
            })
            .collect();
        if moves.is_empty() {
            return Ok(false);
        }
        self.submit(Command::Move { moves })?;
        self.flush();
        Ok(true)
    }

    // ----- grouping ---------------------------------------------------------

    /// Group the selection; the new group becomes the selection.
    pub fn group_selected(&mut self) -> Result<Option<WidgetId>, CommandError> {
        let Some(command) = grouping::build_group(&self.scene, self.selection.selected()) else {
            self.reject("selection cannot be grouped".to_string());
            return Ok(None);
        };
        let Command::Group { group } = &command else {
            return Ok(None);
        };
        let group_id = group.id.clone();
        self.submit(command)?;
        self.selection.select_many(vec![group_id.clone()], false);
        self.flush();
        Ok(Some(group_id))
    }

    /// Ungroup every selected group; the former children become the
    /// selection.
    pub fn ungroup_selected(&mut self) -> Result<bool, CommandError> {
        let groups: Vec<WidgetId> = self
            .selection
            .selected()
            .iter()
            .filter(|id| self.scene.get(id).is_some_and(Widget::is_group))
            .cloned()
            .collect();
        if groups.is_empty() {
            self.reject("selection contains no group".to_string());
            return Ok(false);
        }
        let mut children = Vec::new();
        for group_id in groups {
            let Some(command) = grouping::build_ungroup(&self.scene, &group_id) else {
                continue;
            };
            if let Command::Ungroup { group } = &command {
                if let Some(data) = group.as_group() {
                    children.extend(data.child_ids.iter().cloned());
                }
            }
            self.submit(command)?;
        }
        self.selection.select_many(children, false);
        self.flush();
        Ok(true)
    }

    // ----- z-order ----------------------------------------------------------

    /// Raise the selection above everything else, preserving its internal
    /// stacking.
    pub fn bring_to_front(&mut self) -> Result<bool, CommandError> {
        let mut ids = self.move_set();
        if ids.is_empty() {
            return Ok(false);
        }
        ids.sort_by_key(|id| self.scene.get(id).map_or(0, |w| w.z_index));
        let changes: Vec<ZChange> = ids
            .into_iter()
            .filter_map(|id| {
                let old = self.scene.get(&id)?.z_index;
                Some(ZChange {
                    id,
                    old,
                    new: self.scene.allocate_z(),
                })
            })
            .collect();
        self.submit(Command::ChangeZOrder { changes })?;
        self.flush();
        Ok(true)
    }

    /// Push the selection below everything else, preserving its internal
    /// stacking.
    pub fn send_to_back(&mut self) -> Result<bool, CommandError> {
        let mut ids = self.move_set();
        if ids.is_empty() {
            return Ok(false);
        }
        ids.sort_by_key(|id| self.scene.get(id).map_or(0, |w| w.z_index));
        let floor = self
            .scene
            .widgets()
            .map(|w| w.z_index)
            .min()
            .unwrap_or(0);
        let count = ids.len() as i64;
        let changes: Vec<ZChange> = ids
            .into_iter()
            .enumerate()
            .filter_map(|(index, id)| {
                let old = self.scene.get(&id)?.z_index;
                Some(ZChange {
                    id,
                    old,
                    new: floor - count + index as i64,
                })
            })
            .collect();
        self.submit(Command::ChangeZOrder { changes })?;
        self.flush();
        Ok(true)
    }

    // ----- pointer gestures -------------------------------------------------

    /// Pointer-down: enter Moving, Resizing, or BoxSelecting. A new pointer
    /// is ignored while another pointer owns the active gesture.
    pub fn pointer_down(&mut self, pointer: PointerId, point: Point, shift: bool) {
        if let Some(active) = &self.gesture {
            log::debug!(
                "gesture: ignoring pointer {pointer} down; pointer {} owns the gesture",
                active.pointer
            );
            return;
        }

        if let Some((id, handle)) = self.handle_under(point) {
            if let Some(original) = self.scene.get(&id).map(Widget::bounds) {
                log::debug!("gesture: resize {id} via {handle:?}");
                self.gesture = Some(Gesture::new(
                    pointer,
                    point,
                    GestureKind::Resize {
                        id,
                        handle,
                        original,
                    },
                ));
            }
            return;
        }

        if let Some(id) = self.scene.hit_test(point) {
            if !self.selection.is_selected(&id) {
                self.selection.select(id.clone(), shift);
            } else if shift {
                self.selection.set_reference(&id);
            }
            let origins = self.move_origins();
            log::debug!("gesture: move {} widgets from {point:?}", origins.len());
            self.gesture = Some(Gesture::new(pointer, point, GestureKind::Move { origins }));
            self.flush();
            return;
        }

        log::debug!("gesture: box select from {point:?}");
        self.gesture = Some(Gesture::new(
            pointer,
            point,
            GestureKind::BoxSelect { additive: shift },
        ));
    }

    /// Pointer-move: apply the live delta to the scene (Moving/Resizing) or
    /// grow the marquee (BoxSelecting).
    pub fn pointer_move(&mut self, pointer: PointerId, point: Point) {
        {
            let Some(gesture) = self.gesture.as_mut() else {
                return;
            };
            if gesture.pointer != pointer {
                return;
            }
            gesture.current = point;
            let delta = gesture.delta();
            match &gesture.kind {
                GestureKind::Move { origins } => {
                    for (id, origin) in origins {
                        self.scene.set_position(id, *origin + delta);
                    }
                    self.queue.borrow_mut().push(EditorEvent::SceneChanged);
                }
                GestureKind::Resize {
                    id,
                    handle,
                    original,
                } => {
                    let rect = resize_rect(*original, *handle, delta);
                    self.scene.set_position(id, rect.origin());
                    self.scene.set_size(id, rect.size());
                    self.queue.borrow_mut().push(EditorEvent::SceneChanged);
                }
                GestureKind::BoxSelect { .. } => {}
            }
        }
        self.flush();
    }

    /// Pointer-up: finalize the net effect as a single command, or resolve
    /// the marquee/click selection.
    pub fn pointer_up(&mut self, pointer: PointerId, point: Point) -> Result<(), CommandError> {
        let mut gesture = match self.gesture.take() {
            Some(gesture) if gesture.pointer == pointer => gesture,
            other => {
                self.gesture = other;
                return Ok(());
            }
        };
        gesture.current = point;
        let delta = gesture.delta();

        match gesture.kind {
            GestureKind::Move { origins } => {
                if delta.hypot2() > 0.0 {
                    let moves: Vec<WidgetMove> = origins
                        .into_iter()
                        .filter(|(id, _)| self.scene.contains(id))
                        .map(|(id, origin)| WidgetMove {
                            id,
                            old: origin,
                            new: origin + delta,
                        })
                        .collect();
                    // The scene already shows the final positions; the
                    // command re-applies them and records the undo path.
                    self.submit(Command::Move { moves })?;
                }
            }
            GestureKind::Resize {
                id,
                handle,
                original,
            } => {
                let rect = resize_rect(original, handle, delta);
                if rect != original {
                    self.submit(Command::Resize {
                        id,
                        old_position: original.origin(),
                        old_size: original.size(),
                        new_position: rect.origin(),
                        new_size: rect.size(),
                    })?;
                }
            }
            GestureKind::BoxSelect { additive } => {
                if gesture.exceeded_threshold() {
                    let hits = self.scene.widgets_in_rect(gesture.marquee());
                    self.selection.select_many(hits, additive);
                } else {
                    // A short motion is a deselect click, not a marquee.
                    self.selection.clear();
                }
            }
        }
        self.flush();
        Ok(())
    }

    /// Pointer-cancel: revert the live mutation to the pre-gesture snapshot
    /// and discard the gesture. Nothing becomes undoable.
    pub fn pointer_cancel(&mut self, pointer: PointerId) {
        let gesture = match self.gesture.take() {
            Some(gesture) if gesture.pointer == pointer => gesture,
            other => {
                self.gesture = other;
                return;
            }
        };
        log::debug!("gesture: cancelled by pointer {pointer}");
        match gesture.kind {
            GestureKind::Move { origins } => {
                for (id, origin) in origins {
                    self.scene.set_position(&id, origin);
                }
                self.queue.borrow_mut().push(EditorEvent::SceneChanged);
            }
            GestureKind::Resize { id, original, .. } => {
                self.scene.set_position(&id, original.origin());
                self.scene.set_size(&id, original.size());
                self.queue.borrow_mut().push(EditorEvent::SceneChanged);
            }
            GestureKind::BoxSelect { .. } => {}
        }
        self.flush();
    }

    // ----- document ---------------------------------------------------------

    /// Replace the scene from a serialized document. On failure the
    /// previous scene, history and selection are left untouched.
    pub fn load_document(&mut self, json: &str) -> Result<(), DocumentError> {
        let scene = LayoutDocument::from_json(json)?.into_scene()?;
        self.scene = scene;
        self.gesture = None;
        self.selection.clear();
        self.history.clear();
        self.clipboard.clear();
        self.dirty = false;
        let mut queue = self.queue.borrow_mut();
        queue.push(EditorEvent::DocumentLoaded);
        queue.push(EditorEvent::SceneChanged);
        drop(queue);
        self.flush();
        Ok(())
    }

    /// Serialize the scene's persisted fields and clear the unsaved flag.
    pub fn save_document(&mut self) -> Result<String, DocumentError> {
        let json = LayoutDocument::from_scene(&self.scene).to_json()?;
        self.dirty = false;
        Ok(json)
    }

    /// Low-frequency hygiene pass: only while idle, drop selection entries
    /// that no longer resolve and ask the visual layer to resynchronize
    /// from the authoritative scene.
    pub fn maintenance_tick(&mut self) {
        if self.gesture.is_some() {
            return;
        }
        self.prune_selection();
        self.queue.borrow_mut().push(EditorEvent::SceneChanged);
        self.flush();
    }

    // ----- internals --------------------------------------------------------

    fn submit(&mut self, command: Command) -> Result<(), CommandError> {
        self.history.execute(command, &mut self.scene)?;
        self.dirty = true;
        self.queue.borrow_mut().push(EditorEvent::SceneChanged);
        Ok(())
    }

    fn reject(&mut self, reason: String) {
        log::warn!("editor: {reason}");
        self.queue
            .borrow_mut()
            .push(EditorEvent::OperationRejected { reason });
        self.flush();
    }

    fn flush(&mut self) {
        let events: Vec<EditorEvent> = self.queue.borrow_mut().drain(..).collect();
        if let Some(observer) = &mut self.observer {
            for event in &events {
                observer(event);
            }
        }
    }

    fn prune_selection(&mut self) {
        let scene = &self.scene;
        self.selection.prune(|id| scene.contains(id));
    }

    /// Selected ids expanded with their group children, in selection order,
    /// without duplicates.
    fn move_set(&self) -> Vec<WidgetId> {
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        for id in self.selection.selected() {
            let Some(widget) = self.scene.get(id) else {
                continue;
            };
            if seen.insert(id.clone()) {
                ids.push(id.clone());
            }
            if let Some(group) = widget.as_group() {
                for child in &group.child_ids {
                    if self.scene.contains(child) && seen.insert(child.clone()) {
                        ids.push(child.clone());
                    }
                }
            }
        }
        ids
    }

    fn move_origins(&self) -> HashMap<WidgetId, Point> {
        self.move_set()
            .into_iter()
            .filter_map(|id| self.scene.get(&id).map(|widget| (id, widget.position)))
            .collect()
    }

    /// Deep copies of the selection with group children riding along.
    fn selection_snapshots(&self) -> Vec<Widget> {
        self.move_set()
            .into_iter()
            .filter_map(|id| self.scene.get(&id).cloned())
            .collect()
    }

    /// First resize handle under the point across the selected, resizable
    /// widgets. Groups are move-only and expose no handles.
    fn handle_under(&self, point: Point) -> Option<(WidgetId, ResizeHandle)> {
        for id in self.selection.selected() {
            let Some(widget) = self.scene.get(id) else {
                continue;
            };
            if widget.is_group() {
                continue;
            }
            if let Some(handle) = handle_at(widget.bounds(), point, HANDLE_TOLERANCE) {
                return Some((id.clone(), handle));
            }
        }
        None
    }

    /// Regenerate ids, remap group child lists, offset positions, restack
    /// above the existing scene, then insert everything as one command.
    fn insert_snapshots(&mut self, snapshots: Vec<Widget>) -> Result<Vec<WidgetId>, CommandError> {
        let id_map: HashMap<WidgetId, WidgetId> = snapshots
            .iter()
            .map(|widget| (widget.id.clone(), generate_id()))
            .collect();

        let mut widgets = Vec::with_capacity(snapshots.len());
        for mut widget in snapshots {
            widget.id = id_map[&widget.id].clone();
            widget.position += PASTE_OFFSET;
            if let Some(group) = widget.as_group_mut() {
                for child in &mut group.child_ids {
                    if let Some(new_id) = id_map.get(child) {
                        *child = new_id.clone();
                    }
                }
            }
            widgets.push(widget);
        }

        // Preserve relative stacking while landing above everything.
        let mut by_z: Vec<usize> = (0..widgets.len()).collect();
        by_z.sort_by_key(|&index| widgets[index].z_index);
        for index in by_z {
            widgets[index].z_index = self.scene.allocate_z();
        }
        // Keep the captured child z-indices in step with the restacking.
        let new_z: HashMap<WidgetId, i64> = widgets
            .iter()
            .map(|widget| (widget.id.clone(), widget.z_index))
            .collect();
        for widget in &mut widgets {
            if let Some(group) = widget.as_group_mut() {
                group.child_z = group
                    .child_ids
                    .iter()
                    .map(|child| new_z.get(child).copied().unwrap_or_default())
                    .collect();
            }
        }

        let grouped: HashSet<WidgetId> = widgets
            .iter()
            .filter_map(Widget::as_group)
            .flat_map(|group| group.child_ids.iter().cloned())
            .collect();
        let all_ids: Vec<WidgetId> = widgets.iter().map(|widget| widget.id.clone()).collect();
        let top_level: Vec<WidgetId> = all_ids
            .iter()
            .filter(|id| !grouped.contains(*id))
            .cloned()
            .collect();

        self.submit(Command::Create { widgets })?;
        self.selection.select_many(top_level, false);
        self.flush();
        Ok(all_ids)
    }
}
