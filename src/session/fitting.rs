//! Parameter collection for fitting engines.
//!
//! Fitting engines work on flat vectors of free parameter values. These
//! helpers walk an object tree in field order and move values between the
//! tree and such vectors.

#[cfg(feature = "array")]
use ndarray::Array1;

use std::collections::HashSet;

use crate::constraints::{Bucket, Constraint};
use crate::error::Result;
use crate::graph::Id;
use crate::variables::Object;

use super::Session;

impl Session {
    /// Handles of every value cell and parameter under `root`, depth first
    /// in field order. Shared objects are listed once.
    pub fn get_variables(&self, root: Id) -> Result<Vec<Id>> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        self.collect_values(root, &mut seen, &mut found)?;
        Ok(found)
    }

    fn collect_values(&self, id: Id, seen: &mut HashSet<Id>, found: &mut Vec<Id>) -> Result<()> {
        if !seen.insert(id) {
            return Ok(());
        }
        match self.get_item_by_key(id)? {
            Object::Composite(composite) => {
                for (_, child) in composite.fields() {
                    self.collect_values(child, seen, found)?;
                }
            }
            _ => found.push(id),
        }
        Ok(())
    }

    /// Handles of every parameter under `root`.
    pub fn get_parameters(&self, root: Id) -> Result<Vec<Id>> {
        Ok(self
            .get_variables(root)?
            .into_iter()
            .filter(|id| self.parameter(*id).is_ok())
            .collect())
    }

    /// Handles of the parameters under `root` a fit may vary: enabled and
    /// not fixed.
    pub fn get_fit_parameters(&self, root: Id) -> Result<Vec<Id>> {
        Ok(self
            .get_variables(root)?
            .into_iter()
            .filter(|id| self.parameter(*id).is_ok_and(|p| p.is_free()))
            .collect())
    }

    /// User constraints registered on any value under `root`.
    pub fn user_constraints(&self, root: Id) -> Result<Vec<(Id, String, Constraint)>> {
        let mut all = Vec::new();
        for id in self.get_variables(root)? {
            for (key, constraint) in self.constraints(id, Bucket::User)? {
                all.push((id, key, constraint));
            }
        }
        Ok(all)
    }

    /// Current values of the fit parameters under `root`.
    #[cfg(feature = "array")]
    pub fn fit_values(&self, root: Id) -> Result<Array1<f64>> {
        let mut values = Vec::new();
        for id in self.get_fit_parameters(root)? {
            values.push(self.raw_value(id)?);
        }
        Ok(Array1::from_vec(values))
    }

    /// Write a vector of values back into the fit parameters under `root`
    ///
    /// All writes go through the normal setter pipeline and form one
    /// undoable unit.
    ///
    /// # Arguments
    ///
    /// * `root` - Object tree the values were taken from
    /// * `values` - One value per fit parameter, in [`fit_values`](Self::fit_values) order
    #[cfg(feature = "array")]
    pub fn update_fit_values(&mut self, root: Id, values: &Array1<f64>) -> Result<()> {
        let ids = self.get_fit_parameters(root)?;
        if ids.len() != values.len() {
            return Err(crate::error::CoreError::value(format!(
                "expected {} fit values, got {}",
                ids.len(),
                values.len()
            )));
        }

        let opened = self.stack.is_recording() && !self.stack.macro_running();
        if opened {
            self.stack.begin_macro("Updating fit parameters")?;
        }
        let mut result = Ok(());
        for (id, value) in ids.into_iter().zip(values.iter()) {
            result = self.set_value(id, *value);
            if result.is_err() {
                break;
            }
        }
        if opened {
            self.stack.end_macro()?;
        }
        result
    }
}
