//! Property setters of value cells and parameters.
//!
//! Every setter validates its input, commits, and records one
//! [`UndoCommand`] when the stored value actually changed.

use crate::constraints::{Bucket, Constraint};
use crate::error::{CoreError, Result};
use crate::graph::{GraphError, Id};
use crate::undo::{Field, FieldValue, UndoCommand};
use crate::variables::{Bounds, Object, Quantity, Unit, ValueCell};

use super::{DisabledWritePolicy, Session};

/// Mirrors only change through their source.
fn ensure_not_virtual(cell: &ValueCell) -> Result<()> {
    if cell.is_virtual() {
        return Err(CoreError::VirtualImmutable {
            name: cell.name.clone(),
        });
    }
    Ok(())
}

/// Whether a value write honours the enabled flag of its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// User writes: disabled objects and mirrors are refused
    Checked,
    /// Writes driven by constraints and history replay
    Bypass,
}

impl Session {
    /// Current value of a cell, read through its getter callback if bound
    ///
    /// A successful getter read re-syncs the cached magnitude without
    /// recording history.
    pub fn value(&mut self, id: Id) -> Result<Quantity> {
        let cell = self.cell_mut(id)?;
        if let Some(read) = cell.callback.as_ref().and_then(|cb| cb.get()) {
            cell.magnitude = read.map_err(|e| {
                CoreError::value(format!("getter of '{}' failed: {e}", cell.name))
            })?;
        }
        Ok(cell.quantity())
    }

    /// Cached magnitude of a cell, in its current unit.
    pub fn raw_value(&self, id: Id) -> Result<f64> {
        Ok(self.cell(id)?.magnitude)
    }

    /// Write a new value through the constraint pipeline
    ///
    /// # Arguments
    ///
    /// * `id` - Handle of a value cell or parameter
    /// * `value` - Candidate magnitude in the cell's current unit
    ///
    /// # Returns
    ///
    /// `Ok(())` once the resolved value is committed. A failing setter
    /// callback is reported as [`CoreError::CoreSet`] after the commit.
    pub fn set_value(&mut self, id: Id, value: f64) -> Result<()> {
        self.write_value(id, value, WriteMode::Checked)
    }

    pub(crate) fn write_value(&mut self, id: Id, candidate: f64, mode: WriteMode) -> Result<()> {
        let cell = self.cell(id)?;
        let name = cell.name.clone();
        if mode == WriteMode::Checked {
            if cell.is_virtual() {
                return Err(CoreError::VirtualImmutable { name });
            }
            if !cell.enabled {
                return self.refuse_disabled(id, name, Field::Value);
            }
        }
        let old = cell.magnitude;

        let resolved = self.resolve(id, candidate)?;

        let cell = self.cell_mut(id)?;
        cell.magnitude = resolved;
        let notified = match cell.callback.as_mut() {
            Some(callback) => callback.set(resolved),
            None => Ok(()),
        };
        if resolved != old {
            self.push_change(
                id,
                &name,
                Field::Value,
                FieldValue::Number(old),
                FieldValue::Number(resolved),
            );
        }
        notified.map_err(|e| {
            tracing::warn!(%id, name = %name, error = %e, "setter callback failed after commit");
            CoreError::CoreSet {
                name,
                reason: format!("setter callback failed: {e}"),
            }
        })
    }

    fn refuse_disabled(&self, id: Id, name: String, field: Field) -> Result<()> {
        match self.config.on_disabled_write {
            DisabledWritePolicy::Strict => Err(CoreError::CoreSet {
                name,
                reason: format!("{field} cannot be written while disabled"),
            }),
            DisabledWritePolicy::Lenient => {
                tracing::debug!(%id, name = %name, %field, "ignoring write into disabled object");
                Ok(())
            }
        }
    }

    fn push_change(&mut self, id: Id, name: &str, field: Field, old: FieldValue, new: FieldValue) {
        self.stack.push(UndoCommand::new(id, name, field, old, new));
    }

    /// Set the lower bound of a parameter.
    ///
    /// Fails with [`CoreError::ValueError`] if the bound would exclude the
    /// current value.
    pub fn set_min(&mut self, id: Id, min: f64) -> Result<()> {
        let param = self.parameter(id)?;
        ensure_not_virtual(&param.cell)?;
        let old = param.bounds.min;
        if min == old {
            return Ok(());
        }
        if min.is_nan() || min > param.cell.magnitude {
            return Err(CoreError::value(format!(
                "min {min} of '{}' would exclude the current value {}",
                param.cell.name, param.cell.magnitude
            )));
        }
        let name = param.cell.name.clone();
        self.parameter_mut(id)?.bounds.min = min;
        self.push_change(id, &name, Field::Min, FieldValue::Number(old), FieldValue::Number(min));
        Ok(())
    }

    /// Set the upper bound of a parameter.
    ///
    /// Fails with [`CoreError::ValueError`] if the bound would exclude the
    /// current value.
    pub fn set_max(&mut self, id: Id, max: f64) -> Result<()> {
        let param = self.parameter(id)?;
        ensure_not_virtual(&param.cell)?;
        let old = param.bounds.max;
        if max == old {
            return Ok(());
        }
        if max.is_nan() || max < param.cell.magnitude {
            return Err(CoreError::value(format!(
                "max {max} of '{}' would exclude the current value {}",
                param.cell.name, param.cell.magnitude
            )));
        }
        let name = param.cell.name.clone();
        self.parameter_mut(id)?.bounds.max = max;
        self.push_change(id, &name, Field::Max, FieldValue::Number(old), FieldValue::Number(max));
        Ok(())
    }

    /// Set both bounds as one undoable unit
    ///
    /// The parameter is also enabled and un-fixed, so that it is free to
    /// move inside the new range. A bound passed as `None` is kept.
    ///
    /// # Arguments
    ///
    /// * `id` - Handle of a parameter
    /// * `min` - New lower bound
    /// * `max` - New upper bound
    pub fn set_bounds(&mut self, id: Id, min: Option<f64>, max: Option<f64>) -> Result<()> {
        let param = self.parameter(id)?;
        ensure_not_virtual(&param.cell)?;
        let new_min = min.unwrap_or(param.bounds.min);
        let new_max = max.unwrap_or(param.bounds.max);
        Bounds::new(new_min, new_max)?.check(param.cell.magnitude)?;

        let opened = self.stack.is_recording() && !self.stack.macro_running();
        if opened {
            self.stack.begin_macro("Setting bounds")?;
        }
        let result = self.apply_bounds(id, new_min, new_max);
        if opened {
            self.stack.end_macro()?;
        }
        result
    }

    fn apply_bounds(&mut self, id: Id, min: f64, max: f64) -> Result<()> {
        self.set_min(id, min)?;
        self.set_max(id, max)?;
        if !self.cell(id)?.enabled {
            self.set_enabled(id, true)?;
        }
        if self.parameter(id)?.fixed {
            self.set_fixed(id, false)?;
        }
        Ok(())
    }

    /// Set the standard error of a parameter. Negative values are rejected.
    pub fn set_error(&mut self, id: Id, error: f64) -> Result<()> {
        let param = self.parameter(id)?;
        ensure_not_virtual(&param.cell)?;
        if error.is_nan() || error < 0.0 {
            return Err(CoreError::value(format!(
                "error of '{}' must be non-negative, got {error}",
                param.cell.name
            )));
        }
        let old = param.error;
        if old == error {
            return Ok(());
        }
        let name = param.cell.name.clone();
        self.parameter_mut(id)?.error = error;
        self.push_change(id, &name, Field::Error, FieldValue::Number(old), FieldValue::Number(error));
        Ok(())
    }

    /// Exclude a parameter from fitting, or include it again.
    pub fn set_fixed(&mut self, id: Id, fixed: bool) -> Result<()> {
        let param = self.parameter(id)?;
        let name = param.cell.name.clone();
        if param.cell.is_virtual() {
            return Err(CoreError::VirtualImmutable { name });
        }
        if !param.cell.enabled {
            return self.refuse_disabled(id, name, Field::Fixed);
        }
        let old = param.fixed;
        if old == fixed {
            return Ok(());
        }
        self.parameter_mut(id)?.fixed = fixed;
        self.push_change(id, &name, Field::Fixed, FieldValue::Flag(old), FieldValue::Flag(fixed));
        Ok(())
    }

    /// Switch whether user writes into a cell are accepted.
    pub fn set_enabled(&mut self, id: Id, enabled: bool) -> Result<()> {
        let cell = self.cell(id)?;
        ensure_not_virtual(cell)?;
        let old = cell.enabled;
        if old == enabled {
            return Ok(());
        }
        let name = cell.name.clone();
        self.cell_mut(id)?.enabled = enabled;
        self.push_change(id, &name, Field::Enabled, FieldValue::Flag(old), FieldValue::Flag(enabled));
        Ok(())
    }

    /// Set or clear the display name of a cell.
    pub fn set_display_name(&mut self, id: Id, display_name: Option<&str>) -> Result<()> {
        let cell = self.cell(id)?;
        ensure_not_virtual(cell)?;
        let old = cell.display_name.clone();
        let new = display_name.map(str::to_string);
        if old == new {
            return Ok(());
        }
        let name = cell.name.clone();
        self.cell_mut(id)?.display_name = new.clone();
        self.push_change(id, &name, Field::DisplayName, FieldValue::Text(old), FieldValue::Text(new));
        Ok(())
    }

    /// Convert a cell to another unit, rescaling every stored magnitude
    ///
    /// A dimensionless cell is left as it is. Mirrors of the cell are
    /// converted along with it; a mirror itself cannot be converted.
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::session::Session;
    /// use modelcore_rs::variables::Parameter;
    ///
    /// let mut session = Session::new();
    /// let length = Parameter::with_bounds("length", 1.5, 0.0, 10.0)
    ///     .unwrap()
    ///     .with_unit("m")
    ///     .unwrap();
    /// let id = session.add_parameter(length, None).unwrap();
    ///
    /// session.convert_unit(id, "cm").unwrap();
    /// assert!((session.raw_value(id).unwrap() - 150.0).abs() < 1e-9);
    /// assert!((session.parameter(id).unwrap().max() - 1000.0).abs() < 1e-9);
    /// ```
    pub fn convert_unit(&mut self, id: Id, unit: &str) -> Result<()> {
        let target = Unit::parse(unit)?;
        let cell = self.cell(id)?;
        ensure_not_virtual(cell)?;
        if cell.unit.is_dimensionless() {
            return Ok(());
        }
        let factor = cell.unit.factor_to(&target)?;
        let old = cell.unit.symbol().to_string();
        let name = cell.name.clone();
        let new = target.symbol().to_string();
        self.rescale(id, target.clone(), factor)?;
        self.convert_mirrors(id, &target)?;
        self.push_change(
            id,
            &name,
            Field::Unit,
            FieldValue::Text(Some(old)),
            FieldValue::Text(Some(new)),
        );
        Ok(())
    }

    fn rescale(&mut self, id: Id, unit: Unit, factor: f64) -> Result<()> {
        self.graph.get_item_by_key(id)?;
        match self.objects.get_mut(&id) {
            Some(Object::Parameter(param)) => {
                param.cell.magnitude *= factor;
                param.cell.unit = unit;
                param.bounds = param.bounds.scaled(factor);
                param.error *= factor.abs();
                param.initial_value *= factor;
                Ok(())
            }
            Some(Object::Cell(cell)) => {
                cell.magnitude *= factor;
                cell.unit = unit;
                Ok(())
            }
            Some(object) => Err(CoreError::WrongKind {
                name: object.name().to_string(),
                expected: "value",
            }),
            None => Err(GraphError::UnknownHandle { id }.into()),
        }
    }

    /// Follow a unit change of `source` in every mirror linked to it.
    fn convert_mirrors(&mut self, source: Id, unit: &Unit) -> Result<()> {
        let mirrors: Vec<Id> = self
            .cell(source)?
            .constraints
            .bucket(Bucket::Virtual)
            .values()
            .map(Constraint::dependent)
            .collect();
        for mirror in mirrors {
            let factor = self.cell(mirror)?.unit.factor_to(unit)?;
            self.rescale(mirror, unit.clone(), factor)?;
            tracing::debug!(%source, %mirror, unit = %unit, "converted mirror unit");
        }
        Ok(())
    }

    /// Set a parameter back to its value at construction.
    pub fn reset(&mut self, id: Id) -> Result<()> {
        let initial = self.parameter(id)?.initial_value;
        self.set_value(id, initial)
    }

    /// Apply the `new` side of a recorded command.
    pub(crate) fn replay(&mut self, command: &UndoCommand) -> Result<()> {
        let id = command.target;
        match (command.field, &command.new) {
            (Field::Value, FieldValue::Number(v)) => self.write_value(id, *v, WriteMode::Bypass),
            (Field::Min, FieldValue::Number(v)) => {
                self.parameter_mut(id)?.bounds.min = *v;
                Ok(())
            }
            (Field::Max, FieldValue::Number(v)) => {
                self.parameter_mut(id)?.bounds.max = *v;
                Ok(())
            }
            (Field::Error, FieldValue::Number(v)) => {
                self.parameter_mut(id)?.error = *v;
                Ok(())
            }
            (Field::Fixed, FieldValue::Flag(v)) => {
                self.parameter_mut(id)?.fixed = *v;
                Ok(())
            }
            (Field::Enabled, FieldValue::Flag(v)) => {
                self.cell_mut(id)?.enabled = *v;
                Ok(())
            }
            (Field::DisplayName, FieldValue::Text(v)) => {
                self.cell_mut(id)?.display_name = v.clone();
                Ok(())
            }
            (Field::Unit, FieldValue::Text(Some(symbol))) => {
                let unit = Unit::parse(symbol)?;
                let factor = self.cell(id)?.unit.factor_to(&unit)?;
                self.rescale(id, unit.clone(), factor)?;
                self.convert_mirrors(id, &unit)
            }
            (field, value) => Err(CoreError::value(format!(
                "cannot replay {field} with value {value}"
            ))),
        }
    }
}
