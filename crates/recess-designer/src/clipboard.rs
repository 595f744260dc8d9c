//! Clipboard of widget snapshots.
//!
//! The clipboard only holds deep copies; id regeneration and insertion are
//! the caller's job so pasted widgets never collide with live ones.

use crate::widget::Widget;

/// Held widget snapshots plus a cut/copy flag.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    snapshots: Vec<Widget>,
    from_cut: bool,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held snapshots with copies of `widgets`.
    ///
    /// The caller is expected to have expanded selected groups so their
    /// children ride along; paste then recreates the group coherently.
    pub fn copy(&mut self, widgets: Vec<Widget>) {
        log::debug!("clipboard: copied {} widgets", widgets.len());
        self.snapshots = widgets;
        self.from_cut = false;
    }

    /// Like [`copy`](Self::copy), but marks the content as cut. The caller
    /// is responsible for issuing the matching delete command.
    pub fn cut(&mut self, widgets: Vec<Widget>) {
        self.copy(widgets);
        self.from_cut = true;
    }

    /// Fresh copies of the held snapshots, non-group widgets first so
    /// child ids exist before any group references them. Ids must be
    /// regenerated by the caller before insertion.
    pub fn paste(&self) -> Vec<Widget> {
        let mut out = self.snapshots.clone();
        out.sort_by_key(Widget::is_group);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Whether the held content came from a cut rather than a copy.
    pub fn was_cut(&self) -> bool {
        self.from_cut
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.from_cut = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{GroupData, WidgetKind};
    use kurbo::{Point, Size};

    fn widget(kind: WidgetKind) -> Widget {
        Widget::new(kind, Point::ZERO, Size::new(10.0, 10.0))
    }

    #[test]
    fn test_paste_orders_groups_last() {
        let mut clipboard = Clipboard::new();
        clipboard.copy(vec![
            widget(WidgetKind::Group(GroupData::default())),
            widget(WidgetKind::Box),
            widget(WidgetKind::Text),
        ]);
        let pasted = clipboard.paste();
        assert_eq!(pasted.len(), 3);
        assert!(!pasted[0].is_group());
        assert!(!pasted[1].is_group());
        assert!(pasted[2].is_group());
    }

    #[test]
    fn test_paste_is_non_destructive() {
        let mut clipboard = Clipboard::new();
        clipboard.copy(vec![widget(WidgetKind::Box)]);
        let first = clipboard.paste();
        let second = clipboard.paste();
        assert_eq!(first, second);
        assert!(!clipboard.is_empty());
    }

    #[test]
    fn test_cut_flag() {
        let mut clipboard = Clipboard::new();
        assert!(clipboard.is_empty());
        clipboard.cut(vec![widget(WidgetKind::Box)]);
        assert!(clipboard.was_cut());
        clipboard.copy(vec![widget(WidgetKind::Box)]);
        assert!(!clipboard.was_cut());
    }
}
