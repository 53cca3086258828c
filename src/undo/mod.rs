//! # Undo/Redo
//!
//! [`UndoStack`] keeps the history of committed property changes as
//! [`CommandGroup`]s. A group is either one [`UndoCommand`] or every command
//! recorded between [`UndoStack::begin_macro`] and [`UndoStack::end_macro`].
//!
//! The stack only does bookkeeping. Replaying a group through the setter
//! pipeline is the job of [`Session::undo`](crate::session::Session::undo)
//! and [`Session::redo`](crate::session::Session::redo), which take groups out
//! of the stack, replay them with recording suspended, and hand them back.

pub mod command;

pub use command::{CommandGroup, Field, FieldValue, MacroId, UndoCommand};

use std::collections::VecDeque;
use thiserror::Error;

/// Errors raised by macro bookkeeping
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UndoError {
    #[error("Cannot begin macro '{label}': a macro is already running")]
    MacroAlreadyRunning { label: String },

    #[error("Cannot end macro: no macro is running")]
    NoMacroRunning,
}

/// Bounded history and redo future of command groups
#[derive(Debug, Clone)]
pub struct UndoStack {
    /// Most recent group first
    history: VecDeque<CommandGroup>,

    /// Next group to redo first
    future: VecDeque<CommandGroup>,

    enabled: bool,

    macro_running: bool,

    /// Set while a group is being replayed
    replaying: bool,

    max_history: Option<usize>,

    next_macro: u64,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(true, None)
    }
}

impl UndoStack {
    /// Create a stack
    ///
    /// # Arguments
    ///
    /// * `enabled` - Initial recording state
    /// * `max_history` - Number of groups kept; `None` keeps everything
    pub fn new(enabled: bool, max_history: Option<usize>) -> Self {
        Self {
            history: VecDeque::new(),
            future: VecDeque::new(),
            enabled,
            macro_running: false,
            replaying: false,
            max_history,
            next_macro: 0,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Switch recording on or off. A running macro is closed first.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled && self.macro_running {
            self.close_macro();
        }
        self.enabled = enabled;
    }

    /// Switch recording without touching a running macro.
    ///
    /// # Returns
    ///
    /// The previous recording state, for restoring afterwards.
    pub fn force_state(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.enabled, enabled)
    }

    /// Whether a push right now would be recorded.
    pub fn is_recording(&self) -> bool {
        self.enabled && !self.replaying
    }

    /// Record a committed command
    ///
    /// # Returns
    ///
    /// `true` if the command was recorded, `false` while recording is off or
    /// a group is being replayed.
    pub fn push(&mut self, mut command: UndoCommand) -> bool {
        if !self.is_recording() {
            return false;
        }
        tracing::trace!(text = %command.text, "recording command");
        self.future.clear();
        if self.macro_running {
            if let Some(group) = self.history.front_mut() {
                command.macro_id = group.macro_id;
                group.commands.push(command);
                return true;
            }
        }
        self.history.push_front(CommandGroup::single(command));
        self.trim();
        true
    }

    /// Open a macro; every command pushed until [`end_macro`](Self::end_macro)
    /// becomes one undoable unit.
    pub fn begin_macro(&mut self, label: &str) -> Result<MacroId, UndoError> {
        if self.macro_running {
            return Err(UndoError::MacroAlreadyRunning {
                label: label.to_string(),
            });
        }
        let id = MacroId(self.next_macro);
        self.next_macro += 1;
        self.history.push_front(CommandGroup::with_label(label, id));
        self.macro_running = true;
        self.trim();
        Ok(id)
    }

    /// Close the running macro. An empty macro is discarded.
    pub fn end_macro(&mut self) -> Result<(), UndoError> {
        if !self.macro_running {
            return Err(UndoError::NoMacroRunning);
        }
        self.close_macro();
        Ok(())
    }

    fn close_macro(&mut self) {
        self.macro_running = false;
        if self.history.front().is_some_and(CommandGroup::is_empty) {
            self.history.pop_front();
        }
    }

    pub fn macro_running(&self) -> bool {
        self.macro_running
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty() && !self.macro_running
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty() && !self.macro_running
    }

    /// Text of the group [`Session::undo`](crate::session::Session::undo) would revert.
    pub fn undo_text(&self) -> Option<String> {
        if !self.can_undo() {
            return None;
        }
        self.history.front().map(CommandGroup::text)
    }

    /// Text of the group [`Session::redo`](crate::session::Session::redo) would reapply.
    pub fn redo_text(&self) -> Option<String> {
        if !self.can_redo() {
            return None;
        }
        self.future.front().map(CommandGroup::text)
    }

    pub(crate) fn take_undo(&mut self) -> Option<CommandGroup> {
        if !self.can_undo() {
            return None;
        }
        self.history.pop_front()
    }

    pub(crate) fn take_redo(&mut self) -> Option<CommandGroup> {
        if !self.can_redo() {
            return None;
        }
        self.future.pop_front()
    }

    /// Park an undone group in the redo future.
    pub(crate) fn stash_redo(&mut self, group: CommandGroup) {
        self.future.push_front(group);
    }

    /// Return a redone group to the history without clearing the future.
    pub(crate) fn stash_undo(&mut self, group: CommandGroup) {
        self.history.push_front(group);
        self.trim();
    }

    /// Mark the start of a replay. Returns the previous replay state.
    pub(crate) fn begin_replay(&mut self) -> bool {
        std::mem::replace(&mut self.replaying, true)
    }

    pub(crate) fn end_replay(&mut self, previous: bool) {
        self.replaying = previous;
    }

    /// Drop all history and future.
    pub fn clear(&mut self) {
        self.history.clear();
        self.future.clear();
        self.macro_running = false;
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn max_history(&self) -> Option<usize> {
        self.max_history
    }

    pub fn set_max_history(&mut self, max_history: Option<usize>) {
        self.max_history = max_history;
        self.trim();
    }

    fn trim(&mut self) {
        if let Some(max) = self.max_history {
            self.history.truncate(max);
        }
    }
}
