//! Reversible property changes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::Id;

/// Identifier shared by every command recorded inside one macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacroId(pub u64);

/// The property a command changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Value,
    Min,
    Max,
    Error,
    Fixed,
    Enabled,
    Unit,
    DisplayName,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Value => "value",
            Field::Min => "min",
            Field::Max => "max",
            Field::Error => "error",
            Field::Fixed => "fixed",
            Field::Enabled => "enabled",
            Field::Unit => "unit",
            Field::DisplayName => "display_name",
        };
        f.write_str(name)
    }
}

/// Snapshot of a property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Text(Option<String>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(v) => write!(f, "{v}"),
            FieldValue::Flag(v) => write!(f, "{v}"),
            FieldValue::Text(Some(v)) => f.write_str(v),
            FieldValue::Text(None) => f.write_str("None"),
        }
    }
}

/// A recorded `old -> new` transition of one property of one object.
///
/// Applying the command sets `new`; applying its [`inverse`](Self::inverse)
/// sets `old`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoCommand {
    pub target: Id,
    pub field: Field,
    pub old: FieldValue,
    pub new: FieldValue,
    pub macro_id: Option<MacroId>,
    pub text: String,
}

impl UndoCommand {
    /// Record a transition on the object named `owner`.
    pub fn new(target: Id, owner: &str, field: Field, old: FieldValue, new: FieldValue) -> Self {
        let text = format!("{owner} {field} changed from {old} to {new}");
        Self {
            target,
            field,
            old,
            new,
            macro_id: None,
            text,
        }
    }

    /// The command that reverts this one.
    pub fn inverse(&self) -> UndoCommand {
        UndoCommand {
            target: self.target,
            field: self.field,
            old: self.new.clone(),
            new: self.old.clone(),
            macro_id: self.macro_id,
            text: self.text.clone(),
        }
    }
}

/// One undoable unit: a single command or a macro of several.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandGroup {
    pub(crate) label: Option<String>,
    pub(crate) macro_id: Option<MacroId>,
    pub(crate) commands: Vec<UndoCommand>,
}

impl CommandGroup {
    pub(crate) fn single(command: UndoCommand) -> Self {
        Self {
            label: None,
            macro_id: None,
            commands: vec![command],
        }
    }

    pub(crate) fn with_label(label: &str, macro_id: MacroId) -> Self {
        Self {
            label: Some(label.to_string()),
            macro_id: Some(macro_id),
            commands: Vec::new(),
        }
    }

    /// Commands in recording order.
    pub fn commands(&self) -> &[UndoCommand] {
        &self.commands
    }

    /// Macro label, or the text of the last command.
    pub fn text(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self
                .commands
                .last()
                .map(|c| c.text.clone())
                .unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
