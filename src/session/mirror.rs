//! Virtual mirrors and object release.
//!
//! A mirror is a disabled copy of an object that follows the source's value
//! through an identity link stored in the source's virtual bucket. Mirrors
//! can be turned back into independent objects with [`Session::realize`].

use crate::constraints::{Bucket, Constraint, Transform};
use crate::error::Result;
use crate::graph::{GraphError, Id, BASE_GRAPH};
use crate::variables::{Bounds, Composite, Object, Parameter, ValueCell};

use super::Session;

/// Owned snapshot of an object taken before the session is mutated.
enum Snapshot {
    Cell(ValueCell),
    Parameter(Parameter),
    Composite { name: String, fields: Vec<(String, Id)> },
}

impl Session {
    fn snapshot(&self, id: Id) -> Result<Snapshot> {
        Ok(match self.get_item_by_key(id)? {
            Object::Cell(cell) => Snapshot::Cell(cell.detached_copy()),
            Object::Parameter(param) => Snapshot::Parameter(Parameter {
                cell: param.cell.detached_copy(),
                bounds: param.bounds,
                error: param.error,
                fixed: param.fixed,
                initial_value: param.initial_value,
            }),
            Object::Composite(composite) => Snapshot::Composite {
                name: composite.name.clone(),
                fields: composite
                    .fields()
                    .map(|(field, child)| (field.to_string(), child))
                    .collect(),
            },
        })
    }

    /// Create a read-only mirror of an object
    ///
    /// Leaves get a disabled copy that tracks every change of the source.
    /// Composites are mirrored field by field. Mirroring a mirror links the
    /// new copy to the original source.
    ///
    /// # Returns
    ///
    /// The handle of the mirror
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::session::Session;
    /// use modelcore_rs::variables::Parameter;
    ///
    /// let mut session = Session::new();
    /// let a = session.add_parameter(Parameter::new("a", 1.0), None).unwrap();
    /// let shadow = session.virtualize(a).unwrap();
    ///
    /// session.set_value(a, 4.0).unwrap();
    /// assert_eq!(session.raw_value(shadow).unwrap(), 4.0);
    /// assert!(session.set_value(shadow, 2.0).is_err());
    /// ```
    pub fn virtualize(&mut self, id: Id) -> Result<Id> {
        let source = match self.get_item_by_key(id)?.mirror_of() {
            Some(original) if self.contains(original) => original,
            _ => id,
        };

        let mut object = match self.snapshot(source)? {
            Snapshot::Cell(cell) => Object::Cell(cell),
            Snapshot::Parameter(param) => Object::Parameter(param),
            Snapshot::Composite { name, fields } => {
                return self.virtualize_composite(source, &name, fields)
            }
        };
        if let Some(cell) = object.cell_mut() {
            cell.enabled = false;
            cell.mirror_of = Some(source);
        }
        let mirror = self.register(object, None)?;
        let link = Constraint::ObjRef {
            target: mirror,
            op: Transform::Identity,
            source,
        };
        self.cell_mut(source)?
            .constraints
            .insert(Bucket::Virtual, &mirror.to_string(), link);
        tracing::debug!(%source, %mirror, "created virtual mirror");
        Ok(mirror)
    }

    fn virtualize_composite(
        &mut self,
        source: Id,
        name: &str,
        fields: Vec<(String, Id)>,
    ) -> Result<Id> {
        let mut mirrored = Vec::with_capacity(fields.len());
        for (field, child) in fields {
            mirrored.push((field, self.virtualize(child)?));
        }
        let mut composite = Composite::new(name);
        composite.mirror_of = Some(source);
        let mirror = self.register(Object::Composite(composite), None)?;
        for (field, child) in &mirrored {
            self.attach_field(mirror, field, *child)?;
        }
        Ok(mirror)
    }

    /// Create an independent, enabled copy of a mirror
    ///
    /// The copy carries the mirror's current value. A parameter copy gets the
    /// builtin bound constraints back; its bounds are widened if needed so
    /// that they contain the value. Non-virtual objects are returned as is.
    pub fn realize(&mut self, id: Id) -> Result<Id> {
        if !self.get_item_by_key(id)?.is_virtual() {
            return Ok(id);
        }

        match self.snapshot(id)? {
            Snapshot::Parameter(mut param) => {
                param.cell.enabled = true;
                let value = param.cell.magnitude;
                if !param.bounds.is_within_bounds(value) {
                    tracing::debug!(%id, value, "widening bounds of realized parameter");
                    param.bounds = Bounds {
                        min: param.bounds.min.min(value),
                        max: param.bounds.max.max(value),
                    };
                }
                param.initial_value = value;
                self.add_parameter(param, None)
            }
            Snapshot::Cell(cell) => self.add_cell(cell.with_enabled(true), None),
            Snapshot::Composite { name, fields } => {
                let mut realized = Vec::with_capacity(fields.len());
                for (field, child) in fields {
                    realized.push((field, self.realize(child)?));
                }
                let fields: Vec<(&str, Id)> =
                    realized.iter().map(|(f, c)| (f.as_str(), *c)).collect();
                self.add_composite(&name, &fields)
            }
        }
    }

    /// Replace one field of a composite with a realized copy
    ///
    /// The mirror previously held by the field is released.
    ///
    /// # Returns
    ///
    /// The handle now held by the field
    pub fn realize_component(&mut self, composite: Id, field: &str) -> Result<Id> {
        let child = self.field(composite, field)?;
        let real = self.realize(child)?;
        if real != child {
            self.set_field(composite, field, real)?;
            self.release(child)?;
        }
        Ok(real)
    }

    /// Remove an object from the session
    ///
    /// Children owned by no one else are released with it. Constraints that
    /// mention the object are dropped (re-enabling targets they no longer
    /// drive), a mirror is unlinked from its source, and the callback
    /// finalizer runs. Mirrors of a released source stay behind as inert
    /// copies.
    pub fn release(&mut self, id: Id) -> Result<()> {
        self.get_item_by_key(id)?;

        if let Some(composite) = self.objects.get(&id).and_then(Object::composite) {
            let children: Vec<Id> = composite.fields().map(|(_, child)| child).collect();
            for child in children {
                if self.contains(child) && self.graph.parents(child, BASE_GRAPH)? == [id] {
                    self.release(child)?;
                }
            }
        }

        let mut object = self
            .objects
            .remove(&id)
            .ok_or(GraphError::UnknownHandle { id })?;

        if let Some(source) = object.mirror_of() {
            match self.objects.get_mut(&source).and_then(|o| o.cell_mut()) {
                Some(cell) => {
                    cell.constraints.remove(Bucket::Virtual, &id.to_string());
                }
                None => tracing::debug!(%id, %source, "mirror source already released"),
            }
        }

        let mut dropped: Vec<Constraint> = Vec::new();
        if let Some(cell) = object.cell_mut() {
            if let Some(callback) = cell.callback.as_mut() {
                callback.finalize();
            }
            dropped.extend(cell.constraints.bucket(Bucket::User).values().cloned());
        }
        for cell in self.objects.values_mut().filter_map(|o| o.cell_mut()) {
            let removed = cell.constraints.remove_where(|c| c.references(id));
            dropped.extend(removed.into_iter().map(|(_, _, c)| c));
        }
        for constraint in &dropped {
            self.refresh_enabled(constraint);
        }

        for composite in self.objects.values_mut().filter_map(|o| o.composite_mut()) {
            composite.fields.retain(|_, child| *child != id);
        }

        self.graph.prune(id);
        tracing::debug!(%id, name = %object.name(), "released object");
        Ok(())
    }
}
