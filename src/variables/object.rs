//! The closed set of objects a session can hold.

use crate::graph::{Id, NodeKind};
use crate::variables::composite::Composite;
use crate::variables::cell::ValueCell;
use crate::variables::parameter::Parameter;

/// An object registered in a session.
#[derive(Debug)]
pub enum Object {
    Cell(ValueCell),
    Parameter(Parameter),
    Composite(Composite),
}

impl Object {
    pub fn name(&self) -> &str {
        match self {
            Object::Cell(cell) => &cell.name,
            Object::Parameter(param) => &param.cell.name,
            Object::Composite(composite) => &composite.name,
        }
    }

    /// Short type name used in error messages and records.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Cell(_) => "ValueCell",
            Object::Parameter(_) => "Parameter",
            Object::Composite(_) => "Composite",
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Object::Composite(_) => NodeKind::Composite,
            _ => NodeKind::Value,
        }
    }

    /// The value cell of a cell or parameter.
    pub fn cell(&self) -> Option<&ValueCell> {
        match self {
            Object::Cell(cell) => Some(cell),
            Object::Parameter(param) => Some(&param.cell),
            Object::Composite(_) => None,
        }
    }

    pub fn cell_mut(&mut self) -> Option<&mut ValueCell> {
        match self {
            Object::Cell(cell) => Some(cell),
            Object::Parameter(param) => Some(&mut param.cell),
            Object::Composite(_) => None,
        }
    }

    pub fn parameter(&self) -> Option<&Parameter> {
        match self {
            Object::Parameter(param) => Some(param),
            _ => None,
        }
    }

    pub fn parameter_mut(&mut self) -> Option<&mut Parameter> {
        match self {
            Object::Parameter(param) => Some(param),
            _ => None,
        }
    }

    pub fn composite(&self) -> Option<&Composite> {
        match self {
            Object::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    pub fn composite_mut(&mut self) -> Option<&mut Composite> {
        match self {
            Object::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    /// Source object of a virtual mirror.
    pub fn mirror_of(&self) -> Option<Id> {
        match self {
            Object::Composite(composite) => composite.mirror_of,
            other => other.cell().and_then(|cell| cell.mirror_of),
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.mirror_of().is_some()
    }
}
