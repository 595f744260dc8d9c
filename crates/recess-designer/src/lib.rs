//! Recess Designer core
//!
//! Platform-agnostic interaction and command engine for the Recess
//! break-screen layout designer: the scene model, the transactional
//! command history, selection and clipboard, pointer gestures, and the
//! geometric arrangement operations. Rendering, persistence transport and
//! account plumbing live elsewhere; this crate only maintains the
//! authoritative scene graph and the operations that mutate it.

pub mod arrange;
pub mod clipboard;
pub mod command;
pub mod document;
pub mod editor;
pub mod gesture;
pub mod grouping;
pub mod history;
pub mod scene;
pub mod selection;
pub mod widget;

pub use clipboard::Clipboard;
pub use command::{AlignEdge, Axis, Command, CommandError, SizeMode};
pub use document::{DocumentError, LayoutDocument};
pub use editor::{Editor, EditorEvent};
pub use gesture::{Gesture, GestureKind, PointerId, ResizeHandle};
pub use history::{CommandHistory, HistoryStatus, MAX_UNDO_DEPTH};
pub use scene::Scene;
pub use selection::SelectionManager;
pub use widget::{GroupData, Widget, WidgetId, WidgetKind};
