//! Bounded undo/redo command history.

use crate::command::{Command, CommandError};
use crate::scene::Scene;

/// Maximum number of undoable commands kept; the oldest entry is discarded
/// on overflow.
pub const MAX_UNDO_DEPTH: usize = 50;

/// Undo/redo availability, passed to the change listener so UI affordances
/// stay in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
}

type ChangeListener = Box<dyn FnMut(HistoryStatus)>;

/// Ordered undo and redo stacks of commands.
///
/// Failure policy: command errors are never swallowed. A command that fails
/// to undo or redo is pushed back onto the stack it came from, so the
/// stacks describe the same state as before the attempt, and the error is
/// re-raised to the caller for user-facing reporting.
#[derive(Default)]
pub struct CommandHistory {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    listener: Option<ChangeListener>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the "history changed" callback, invoked after every
    /// successful operation.
    pub fn set_change_listener(&mut self, listener: impl FnMut(HistoryStatus) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Description of the command the next `undo` would revert.
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(Command::description)
    }

    /// Description of the command the next `redo` would replay.
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(Command::description)
    }

    /// Execute a command and record it as undoable.
    ///
    /// The redo stack is cleared and the undo stack trimmed to the most
    /// recent [`MAX_UNDO_DEPTH`] entries.
    pub fn execute(&mut self, command: Command, scene: &mut Scene) -> Result<(), CommandError> {
        command.execute(scene)?;
        log::debug!("history: executed '{}'", command.description());
        self.undo_stack.push(command);
        if self.undo_stack.len() > MAX_UNDO_DEPTH {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
        self.notify();
        Ok(())
    }

    /// Revert the most recent command. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self, scene: &mut Scene) -> Result<bool, CommandError> {
        let Some(command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.undo(scene) {
            log::error!("history: undo of '{}' failed: {err}", command.description());
            self.undo_stack.push(command);
            return Err(err);
        }
        log::debug!("history: undid '{}'", command.description());
        self.redo_stack.push(command);
        self.notify();
        Ok(true)
    }

    /// Replay the most recently undone command. Returns `false` when there
    /// is nothing to redo.
    pub fn redo(&mut self, scene: &mut Scene) -> Result<bool, CommandError> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.execute(scene) {
            log::error!("history: redo of '{}' failed: {err}", command.description());
            self.redo_stack.push(command);
            return Err(err);
        }
        log::debug!("history: redid '{}'", command.description());
        self.undo_stack.push(command);
        self.notify();
        Ok(true)
    }

    /// Drop both stacks (document load).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.notify();
    }

    fn notify(&mut self) {
        let status = self.status();
        if let Some(listener) = &mut self.listener {
            listener(status);
        }
    }
}
