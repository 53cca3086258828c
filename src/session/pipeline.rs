//! Constraint resolution and registration.
//!
//! A candidate value is run through the builtin, user and virtual buckets of
//! its object in that order. Gating constraints may substitute the candidate;
//! external constraints push derived values into their targets and leave the
//! candidate alone. History recording is suspended for the whole run.

use std::collections::{HashMap, HashSet};

use crate::constraints::{Bucket, Constraint, ConstraintError};
use crate::error::Result;
use crate::graph::Id;
use crate::variables::Parameter;

use super::setters::WriteMode;
use super::Session;

impl Session {
    pub(crate) fn install_builtins(&mut self, id: Id) -> Result<()> {
        let builtins = Parameter::builtin_constraints(id)?;
        let cell = self.cell_mut(id)?;
        for (key, constraint) in builtins {
            cell.constraints.insert(Bucket::Builtin, key, constraint);
        }
        Ok(())
    }

    /// Resolve the value `candidate` would commit as for object `id`.
    pub(crate) fn resolve(&mut self, id: Id, candidate: f64) -> Result<f64> {
        let previous = self.stack.force_state(false);
        self.pending.push((id, candidate));
        let slot = self.pending.len() - 1;
        let result = self.run_constraints(id, slot);
        self.pending.truncate(slot);
        self.stack.force_state(previous);
        result
    }

    fn run_constraints(&mut self, id: Id, slot: usize) -> Result<f64> {
        let constraints = self.cell(id)?.constraints.ordered();
        for (bucket, key, constraint) in constraints {
            if constraint.is_external() {
                self.apply_external(id, &constraint)?;
                continue;
            }
            let current = self.pending[slot].1;
            let next = constraint.evaluate(&*self)?;
            if next != current {
                tracing::debug!(
                    %id,
                    ?bucket,
                    constraint = %key,
                    from = current,
                    to = next,
                    "constraint substituted candidate"
                );
                self.pending[slot].1 = next;
            }
        }
        Ok(self.pending[slot].1)
    }

    fn apply_external(&mut self, owner: Id, constraint: &Constraint) -> Result<()> {
        let target = constraint.dependent();
        if self.pending.iter().any(|(p, _)| *p == target) {
            return Err(ConstraintError::Cycle { owner, target }.into());
        }
        let value = constraint.evaluate(&*self)?;
        self.write_value(target, value, WriteMode::Bypass)
    }

    /// Register a user constraint on `owner`
    ///
    /// Gating constraints must constrain `owner` itself. External constraints
    /// are triggered whenever `owner` changes and disable their target, which
    /// from then on is driven by the constraint only.
    ///
    /// # Arguments
    ///
    /// * `owner` - Object whose changes trigger the constraint
    /// * `key` - Name of the constraint; an existing key is replaced in place
    /// * `constraint` - The constraint
    pub fn add_constraint(&mut self, owner: Id, key: &str, constraint: Constraint) -> Result<()> {
        self.cell(owner)?;
        for operand in constraint
            .independents()
            .into_iter()
            .chain(std::iter::once(constraint.dependent()))
        {
            self.cell(operand)?;
        }

        let target = constraint.dependent();
        if !constraint.is_external() && target != owner {
            return Err(ConstraintError::ForeignOperand {
                owner,
                operand: target,
            }
            .into());
        }
        if constraint.is_external() && self.config.detect_cycles && self.reaches(target, owner) {
            return Err(ConstraintError::Cycle { owner, target }.into());
        }

        let previous = self
            .cell_mut(owner)?
            .constraints
            .insert(Bucket::User, key, constraint.clone());
        if constraint.is_external() {
            self.cell_mut(target)?.enabled = false;
        }
        if let Some(previous) = previous {
            self.refresh_enabled(&previous);
        }
        Ok(())
    }

    /// Remove a user constraint from `owner`
    ///
    /// The target of a removed external constraint is enabled again unless
    /// another external constraint still drives it.
    pub fn remove_constraint(&mut self, owner: Id, key: &str) -> Result<Constraint> {
        let removed = self
            .cell_mut(owner)?
            .constraints
            .remove(Bucket::User, key)
            .ok_or_else(|| ConstraintError::UnknownConstraint {
                owner,
                key: key.to_string(),
            })?;
        self.refresh_enabled(&removed);
        Ok(removed)
    }

    /// Constraints of one bucket of `owner`, in evaluation order.
    pub fn constraints(&self, owner: Id, bucket: Bucket) -> Result<Vec<(String, Constraint)>> {
        Ok(self
            .cell(owner)?
            .constraints
            .bucket(bucket)
            .iter()
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect())
    }

    /// Evaluate a constraint once and write the result into its dependent
    ///
    /// The write bypasses the dependent's enabled flag and is recorded as one
    /// undoable change.
    ///
    /// # Returns
    ///
    /// The value committed to the dependent
    pub fn apply_constraint(&mut self, constraint: &Constraint) -> Result<f64> {
        let value = constraint.evaluate(&*self)?;
        let target = constraint.dependent();
        self.write_value(target, value, WriteMode::Bypass)?;
        Ok(self.cell(target)?.magnitude)
    }

    /// Re-enable the target of a dropped external constraint if nothing else
    /// drives it.
    pub(crate) fn refresh_enabled(&mut self, dropped: &Constraint) {
        if !dropped.is_external() {
            return;
        }
        let target = dropped.dependent();
        let still_driven = self.objects.values().any(|object| {
            object.cell().is_some_and(|cell| {
                cell.constraints
                    .bucket(Bucket::User)
                    .values()
                    .any(|c| c.is_external() && c.dependent() == target)
            })
        });
        if still_driven {
            return;
        }
        if let Some(cell) = self.objects.get_mut(&target).and_then(|o| o.cell_mut()) {
            if !cell.is_virtual() {
                cell.enabled = true;
            }
        }
    }

    /// Whether a change of `from` can propagate to `to` through external
    /// constraints (including `from == to`).
    fn reaches(&self, from: Id, to: Id) -> bool {
        let mut edges: HashMap<Id, Vec<Id>> = HashMap::new();
        for (&owner, object) in &self.objects {
            if let Some(cell) = object.cell() {
                for bucket in [Bucket::User, Bucket::Virtual] {
                    for c in cell.constraints.bucket(bucket).values() {
                        if c.is_external() {
                            edges.entry(owner).or_default().push(c.dependent());
                        }
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(next) = edges.get(&current) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }
}
