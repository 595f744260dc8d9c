//! Selection state: membership, ordering, and the reference widget.
//!
//! The selection holds ids only; the transient "selected" and "reference"
//! styling flags are joined by id at render time, never stored on widgets.

use crate::widget::WidgetId;

type ChangeListener = Box<dyn FnMut(&[WidgetId], Option<&WidgetId>)>;

/// Ordered set of selected widget ids plus the distinguished reference
/// widget used as the anchor for align/same-size operations.
#[derive(Default)]
pub struct SelectionManager {
    /// Selection order; the first entry is the oldest member.
    ids: Vec<WidgetId>,
    reference: Option<WidgetId>,
    listener: Option<ChangeListener>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the selection-changed callback used to refresh per-widget
    /// styling and the properties panel.
    pub fn set_change_listener(
        &mut self,
        listener: impl FnMut(&[WidgetId], Option<&WidgetId>) + 'static,
    ) {
        self.listener = Some(Box::new(listener));
    }

    /// Selected ids in selection order.
    pub fn selected(&self) -> &[WidgetId] {
        &self.ids
    }

    pub fn reference(&self) -> Option<&WidgetId> {
        self.reference.as_ref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.iter().any(|other| other == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Select one widget. With `additive` false the selection is replaced
    /// and the widget becomes the reference; with `additive` true it is
    /// appended and the reference keeps pointing at the first member.
    pub fn select(&mut self, id: WidgetId, additive: bool) {
        if additive {
            if self.is_selected(&id) {
                return;
            }
            if self.ids.is_empty() {
                self.reference = Some(id.clone());
            }
            self.ids.push(id);
        } else {
            if self.ids.as_slice() == std::slice::from_ref(&id)
                && self.reference.as_ref() == Some(&id)
            {
                return;
            }
            self.ids = vec![id.clone()];
            self.reference = Some(id);
        }
        self.notify();
    }

    /// Replace or extend the selection with many ids at once (marquee
    /// selection). Order is preserved; duplicates are dropped.
    pub fn select_many(&mut self, ids: Vec<WidgetId>, additive: bool) {
        let before_ids = self.ids.clone();
        let before_reference = self.reference.clone();
        if !additive {
            self.ids.clear();
            self.reference = None;
        }
        for id in ids {
            if !self.is_selected(&id) {
                if self.ids.is_empty() {
                    self.reference = Some(id.clone());
                }
                self.ids.push(id);
            }
        }
        if self.ids != before_ids || self.reference != before_reference {
            self.notify();
        }
    }

    pub fn deselect(&mut self, id: &str) {
        let before = self.ids.len();
        self.ids.retain(|other| other != id);
        if self.ids.len() == before {
            return;
        }
        if self.reference.as_deref() == Some(id) {
            self.reference = self.ids.first().cloned();
        }
        self.notify();
    }

    pub fn clear(&mut self) {
        if self.ids.is_empty() && self.reference.is_none() {
            return;
        }
        self.ids.clear();
        self.reference = None;
        self.notify();
    }

    /// Re-point the reference at an already-selected widget without
    /// changing membership (shift-click on a selected widget).
    pub fn set_reference(&mut self, id: &str) {
        if !self.is_selected(id) {
            log::warn!("selection: cannot set reference to unselected widget {id}");
            return;
        }
        if self.reference.as_deref() == Some(id) {
            return;
        }
        self.reference = Some(id.to_string());
        self.notify();
    }

    /// Drop ids no longer accepted by `keep` (widgets removed from the
    /// scene). Used on deletion, undo/redo, and the maintenance tick.
    pub fn prune(&mut self, mut keep: impl FnMut(&WidgetId) -> bool) {
        let before = self.ids.len();
        self.ids.retain(|id| keep(id));
        if self.ids.len() == before {
            return;
        }
        if let Some(reference) = &self.reference {
            if !self.ids.contains(reference) {
                self.reference = self.ids.first().cloned();
            }
        }
        self.notify();
    }

    fn notify(&mut self) {
        if let Some(listener) = &mut self.listener {
            listener(&self.ids, self.reference.as_ref());
        }
    }
}
