//! Composite objects owning named fields.

use indexmap::IndexMap;

use crate::graph::Id;

/// An object whose state is a set of named child objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    /// Name of the composite
    pub name: String,

    pub(crate) fields: IndexMap<String, Id>,

    /// Source composite when this is a virtual mirror
    pub(crate) mirror_of: Option<Id>,
}

impl Composite {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: IndexMap::new(),
            mirror_of: None,
        }
    }

    /// Handle of a field.
    pub fn field(&self, name: &str) -> Option<Id> {
        self.fields.get(name).copied()
    }

    /// Field names and handles in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, Id)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Name under which `child` is held, if any.
    pub fn field_name_of(&self, child: Id) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, id)| **id == child)
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn mirror_of(&self) -> Option<Id> {
        self.mirror_of
    }

    pub fn is_virtual(&self) -> bool {
        self.mirror_of.is_some()
    }
}
