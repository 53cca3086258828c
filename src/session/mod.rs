//! # Session
//!
//! A [`Session`] owns every modeled object together with the identity graph
//! that names them and the undo stack that records their changes. Objects are
//! addressed by [`Id`]; all mutation goes through session methods so that the
//! constraint pipeline and history are applied consistently.
//!
//! ```rust
//! use modelcore_rs::constraints::Constraint;
//! use modelcore_rs::session::Session;
//! use modelcore_rs::variables::Parameter;
//!
//! let mut session = Session::new();
//! let a = session.add_parameter(Parameter::new("a", 1.0), None).unwrap();
//! let b = session.add_parameter(Parameter::new("b", 2.0), None).unwrap();
//!
//! let link = Constraint::obj_ref(a, "2*", b).unwrap();
//! session.add_constraint(b, "a_from_b", link).unwrap();
//!
//! session.set_value(b, 3.0).unwrap();
//! assert_eq!(session.raw_value(a).unwrap(), 6.0);
//!
//! session.undo().unwrap();
//! assert_eq!(session.raw_value(b).unwrap(), 2.0);
//! assert_eq!(session.raw_value(a).unwrap(), 4.0);
//! ```

pub mod config;
mod fitting;
mod mirror;
mod pipeline;
pub mod record;
mod setters;

pub use config::{DisabledWritePolicy, SessionConfig};
pub use record::Record;

use std::collections::HashMap;

use crate::constraints::{ConstraintError, EvaluationContext, FieldRef};
use crate::error::{CoreError, Result};
use crate::graph::{GraphError, Id, IdentityGraph, NodeTag, BASE_GRAPH};
use crate::undo::UndoStack;
use crate::variables::{Composite, Object, Parameter, ValueCell};

/// Arena of modeled objects with their graph, history and configuration.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    graph: IdentityGraph,
    objects: HashMap<Id, Object>,
    stack: UndoStack,
    /// Candidate values of objects whose constraints are being resolved
    pending: Vec<(Id, f64)>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a session with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a session with an explicit configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        let stack = UndoStack::new(config.record_history, config.max_history);
        Self {
            config,
            graph: IdentityGraph::new(),
            objects: HashMap::new(),
            stack,
            pending: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The identity graph of the session.
    pub fn graph(&self) -> &IdentityGraph {
        &self.graph
    }

    /// Snapshot the current ownership graph under `name`.
    pub fn create_synced_graph(&mut self, name: &str) -> Result<()> {
        Ok(self.graph.create_synced_graph(name)?)
    }

    pub fn stack(&self) -> &UndoStack {
        &self.stack
    }

    /// Mutable access for macros, recording state and history limits.
    pub fn stack_mut(&mut self) -> &mut UndoStack {
        &mut self.stack
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Register a value cell
    ///
    /// # Arguments
    ///
    /// * `cell` - The detached cell
    /// * `owner` - Optional owning object; an ownership edge is added
    ///
    /// # Returns
    ///
    /// The handle of the new cell
    pub fn add_cell(&mut self, cell: ValueCell, owner: Option<Id>) -> Result<Id> {
        self.register(Object::Cell(cell), owner)
    }

    /// Register a parameter and install its `min`/`max` constraints
    ///
    /// # Arguments
    ///
    /// * `param` - The detached parameter
    /// * `owner` - Optional owning object; an ownership edge is added
    ///
    /// # Returns
    ///
    /// The handle of the new parameter
    pub fn add_parameter(&mut self, param: Parameter, owner: Option<Id>) -> Result<Id> {
        let id = self.register(Object::Parameter(param), owner)?;
        self.install_builtins(id)?;
        Ok(id)
    }

    /// Register a composite owning the given fields
    ///
    /// Every field becomes an owned child (tag `CreatedInternal`) of the new
    /// composite. Unknown handles are rejected before anything is registered.
    pub fn add_composite(&mut self, name: &str, fields: &[(&str, Id)]) -> Result<Id> {
        for (_, child) in fields {
            self.get_item_by_key(*child)?;
        }
        let id = self.register(Object::Composite(Composite::new(name)), None)?;
        for (field, child) in fields {
            self.attach_field(id, field, *child)?;
        }
        Ok(id)
    }

    /// Replace (or add) one field of a composite.
    ///
    /// # Returns
    ///
    /// The handle previously held under `field`, if any. The previous child
    /// stays registered; release it explicitly when it is no longer needed.
    pub fn set_field(&mut self, composite: Id, field: &str, child: Id) -> Result<Option<Id>> {
        self.get_item_by_key(child)?;
        let previous = self.composite(composite)?.field(field);
        if let Some(old) = previous {
            self.graph.remove_edge(composite, old, BASE_GRAPH)?;
        }
        self.attach_field(composite, field, child)?;
        Ok(previous)
    }

    /// Handle of a composite's field.
    pub fn field(&self, composite: Id, field: &str) -> Result<Id> {
        let c = self.composite(composite)?;
        c.field(field).ok_or_else(|| CoreError::UnknownField {
            name: c.name.clone(),
            field: field.to_string(),
        })
    }

    fn attach_field(&mut self, composite: Id, field: &str, child: Id) -> Result<()> {
        self.composite_mut(composite)?
            .fields
            .insert(field.to_string(), child);
        self.graph.add_edge(composite, child, None, BASE_GRAPH)?;
        self.graph.reset_tags(child, NodeTag::CreatedInternal)?;
        Ok(())
    }

    pub(crate) fn register(&mut self, object: Object, owner: Option<Id>) -> Result<Id> {
        if let Some(owner) = owner {
            self.get_item_by_key(owner)?;
        }
        let id = self.graph.add_node(object.kind(), &[NodeTag::Created]);
        self.objects.insert(id, object);
        if let Some(owner) = owner {
            self.graph.add_edge(owner, id, None, BASE_GRAPH)?;
        }
        Ok(id)
    }

    /// Look up a live object by handle.
    pub fn get_item_by_key(&self, id: Id) -> Result<&Object> {
        self.graph.get_item_by_key(id)?;
        self.objects
            .get(&id)
            .ok_or_else(|| GraphError::UnknownHandle { id }.into())
    }

    /// Whether the handle refers to a live object.
    pub fn contains(&self, id: Id) -> bool {
        self.graph.contains(id) && self.objects.contains_key(&id)
    }

    /// First live object (lowest handle) with the given name.
    pub fn handle_of(&self, name: &str) -> Option<Id> {
        self.graph
            .handles()
            .into_iter()
            .find(|id| self.objects.get(id).is_some_and(|o| o.name() == name))
    }

    /// Dotted attribute route from the outermost owner down to `id`,
    /// e.g. `"sample.cell.a"`.
    pub fn route_name(&self, id: Id) -> Result<String> {
        let route = self.graph.reverse_route(id, None, BASE_GRAPH)?;
        let mut parts: Vec<String> = Vec::with_capacity(route.len());
        let mut steps = route.iter().rev().peekable();
        while let Some(&current) = steps.next() {
            if parts.is_empty() {
                parts.push(self.get_item_by_key(current)?.name().to_string());
            }
            if let Some(&&child) = steps.peek() {
                let label = match self.get_item_by_key(current)?.composite() {
                    Some(c) => c.field_name_of(child).map(str::to_string),
                    None => None,
                };
                let label = match label {
                    Some(label) => label,
                    None => self.get_item_by_key(child)?.name().to_string(),
                };
                parts.push(label);
            }
        }
        Ok(parts.join("."))
    }

    /// The cell of a value cell or parameter.
    pub fn cell(&self, id: Id) -> Result<&ValueCell> {
        let object = self.get_item_by_key(id)?;
        object.cell().ok_or_else(|| CoreError::WrongKind {
            name: object.name().to_string(),
            expected: "value",
        })
    }

    pub(crate) fn cell_mut(&mut self, id: Id) -> Result<&mut ValueCell> {
        self.graph.get_item_by_key(id)?;
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(GraphError::UnknownHandle { id })?;
        let name = object.name().to_string();
        object.cell_mut().ok_or(CoreError::WrongKind {
            name,
            expected: "value",
        })
    }

    pub fn parameter(&self, id: Id) -> Result<&Parameter> {
        let object = self.get_item_by_key(id)?;
        object.parameter().ok_or_else(|| CoreError::WrongKind {
            name: object.name().to_string(),
            expected: "parameter",
        })
    }

    pub(crate) fn parameter_mut(&mut self, id: Id) -> Result<&mut Parameter> {
        self.graph.get_item_by_key(id)?;
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(GraphError::UnknownHandle { id })?;
        let name = object.name().to_string();
        object.parameter_mut().ok_or(CoreError::WrongKind {
            name,
            expected: "parameter",
        })
    }

    pub fn composite(&self, id: Id) -> Result<&Composite> {
        let object = self.get_item_by_key(id)?;
        object.composite().ok_or_else(|| CoreError::WrongKind {
            name: object.name().to_string(),
            expected: "composite",
        })
    }

    pub(crate) fn composite_mut(&mut self, id: Id) -> Result<&mut Composite> {
        self.graph.get_item_by_key(id)?;
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(GraphError::UnknownHandle { id })?;
        let name = object.name().to_string();
        object.composite_mut().ok_or(CoreError::WrongKind {
            name,
            expected: "composite",
        })
    }

    /// Revert the most recent undoable unit
    ///
    /// Commands of the unit are replayed newest first with recording
    /// suspended. Every command is attempted; the first failure is returned
    /// after the unit has moved to the redo future.
    ///
    /// # Returns
    ///
    /// `false` if there was nothing to undo
    pub fn undo(&mut self) -> Result<bool> {
        let Some(group) = self.stack.take_undo() else {
            return Ok(false);
        };
        let previous = self.stack.begin_replay();
        let mut first_error = None;
        for command in group.commands().iter().rev() {
            if let Err(e) = self.replay(&command.inverse()) {
                tracing::warn!(%e, text = %command.text, "failed to undo command");
                first_error.get_or_insert(e);
            }
        }
        self.stack.end_replay(previous);
        self.stack.stash_redo(group);
        first_error.map_or(Ok(true), Err)
    }

    /// Reapply the most recently undone unit, oldest command first.
    ///
    /// # Returns
    ///
    /// `false` if there was nothing to redo
    pub fn redo(&mut self) -> Result<bool> {
        let Some(group) = self.stack.take_redo() else {
            return Ok(false);
        };
        let previous = self.stack.begin_replay();
        let mut first_error = None;
        for command in group.commands() {
            if let Err(e) = self.replay(command) {
                tracing::warn!(%e, text = %command.text, "failed to redo command");
                first_error.get_or_insert(e);
            }
        }
        self.stack.end_replay(previous);
        self.stack.stash_undo(group);
        first_error.map_or(Ok(true), Err)
    }
}

impl EvaluationContext for Session {
    fn raw_value(&self, id: Id) -> std::result::Result<f64, ConstraintError> {
        if let Some((_, candidate)) = self.pending.iter().rev().find(|(p, _)| *p == id) {
            return Ok(*candidate);
        }
        self.objects
            .get(&id)
            .and_then(Object::cell)
            .map(|cell| cell.magnitude)
            .ok_or(ConstraintError::UnknownOperand { id })
    }

    fn field_value(&self, id: Id, field: FieldRef) -> std::result::Result<f64, ConstraintError> {
        self.objects
            .get(&id)
            .and_then(Object::parameter)
            .map(|param| param.field(field))
            .ok_or(ConstraintError::MissingField { id, field })
    }
}
