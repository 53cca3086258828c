//! # Constraints
//!
//! Constraints rewrite the candidate value of a parameter before it is
//! committed. They come in two flavours:
//!
//! - **Gating** constraints ([`Constraint::Numeric`], [`Constraint::SelfRef`])
//!   compare the candidate with a bound and substitute the bound when the
//!   comparison fails.
//! - **External** constraints ([`Constraint::ObjRef`], [`Constraint::MultiObj`])
//!   compute the value of another object (their *target*) from their operands
//!   and write it there.
//!
//! Constraints name their operands by [`Id`], never by reference, so they can
//! be cloned, serialized and evaluated against any [`EvaluationContext`].
//!
//! ```rust
//! use modelcore_rs::constraints::{Constraint, SimpleContext};
//! use modelcore_rs::graph::Id;
//!
//! let a = Id::new(0, 0);
//! let b = Id::new(1, 0);
//! let mut ctx = SimpleContext::new();
//! ctx.set_value(b, 2.0);
//!
//! let c = Constraint::obj_ref(a, "2*", b).unwrap();
//! assert_eq!(c.evaluate(&ctx).unwrap(), 4.0);
//! ```

pub mod buckets;
pub mod operator;

pub use buckets::{Bucket, ConstraintBuckets};
pub use operator::{Comparison, Transform};

use crate::graph::Id;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Error that can occur when working with constraints
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    #[error("Invalid constraint operator '{text}'")]
    InvalidOperator { text: String },

    #[error("Constraint on {id} cannot depend on itself")]
    SelfReference { id: Id },

    #[error("Constraint registered on {owner} cannot gate {operand}")]
    ForeignOperand { owner: Id, operand: Id },

    #[error("Constraint from {owner} to {target} would create a propagation cycle")]
    Cycle { owner: Id, target: Id },

    #[error("Division by zero while evaluating a constraint on {operand}")]
    DivisionByZero { operand: Id },

    #[error("Constraint operand {id} is not a value")]
    UnknownOperand { id: Id },

    #[error("Operand {id} has no field '{field}'")]
    MissingField { id: Id, field: FieldRef },

    #[error("Object {owner} has no constraint '{key}'")]
    UnknownConstraint { owner: Id, key: String },
}

/// Attribute of a parameter a [`Constraint::SelfRef`] compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldRef {
    Min,
    Max,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Min => f.write_str("min"),
            FieldRef::Max => f.write_str("max"),
        }
    }
}

/// Read access to operand values during evaluation
pub trait EvaluationContext {
    /// Current (or candidate) raw value of an operand
    fn raw_value(&self, id: Id) -> Result<f64, ConstraintError>;

    /// Value of a named attribute of an operand
    fn field_value(&self, id: Id, field: FieldRef) -> Result<f64, ConstraintError>;
}

/// A simple map-backed evaluation context
#[derive(Debug, Clone, Default)]
pub struct SimpleContext {
    values: HashMap<Id, f64>,
    fields: HashMap<(Id, FieldRef), f64>,
}

impl SimpleContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw value of an operand
    pub fn set_value(&mut self, id: Id, value: f64) {
        self.values.insert(id, value);
    }

    /// Set an attribute of an operand
    pub fn set_field(&mut self, id: Id, field: FieldRef, value: f64) {
        self.fields.insert((id, field), value);
    }
}

impl EvaluationContext for SimpleContext {
    fn raw_value(&self, id: Id) -> Result<f64, ConstraintError> {
        self.values
            .get(&id)
            .copied()
            .ok_or(ConstraintError::UnknownOperand { id })
    }

    fn field_value(&self, id: Id, field: FieldRef) -> Result<f64, ConstraintError> {
        self.fields
            .get(&(id, field))
            .copied()
            .ok_or(ConstraintError::MissingField { id, field })
    }
}

/// A rule that rewrites or derives a parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// Keep `operand op literal`; substitute `literal` when it fails.
    Numeric {
        operand: Id,
        op: Comparison,
        literal: f64,
    },
    /// Keep `operand op operand.field`; substitute the field when it fails.
    SelfRef {
        operand: Id,
        op: Comparison,
        field: FieldRef,
    },
    /// `target = op(source)`
    ObjRef {
        target: Id,
        op: Transform,
        source: Id,
    },
    /// `target = literal - sum(coefficient * source)`
    MultiObj {
        target: Id,
        sources: Vec<(Id, f64)>,
        literal: f64,
    },
}

impl Constraint {
    /// Gate `operand` against a literal bound.
    ///
    /// # Arguments
    ///
    /// * `operand` - The constrained value
    /// * `op` - One of `<`, `<=`, `>`, `>=`, `==`, `!=`
    /// * `literal` - The bound substituted when the comparison fails
    pub fn numeric(operand: Id, op: &str, literal: f64) -> Result<Self, ConstraintError> {
        Ok(Constraint::Numeric {
            operand,
            op: Comparison::parse(op)?,
            literal,
        })
    }

    /// Gate `operand` against one of its own attributes.
    pub fn self_ref(operand: Id, op: &str, field: FieldRef) -> Result<Self, ConstraintError> {
        Ok(Constraint::SelfRef {
            operand,
            op: Comparison::parse(op)?,
            field,
        })
    }

    /// Derive `target` from `source` through an affine transform such as
    /// `"2*"` or `"1-"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::constraints::Constraint;
    /// use modelcore_rs::graph::Id;
    ///
    /// let a = Id::new(0, 0);
    /// assert!(Constraint::obj_ref(a, "2*", a).is_err());
    /// ```
    pub fn obj_ref(target: Id, op: &str, source: Id) -> Result<Self, ConstraintError> {
        if target == source {
            return Err(ConstraintError::SelfReference { id: target });
        }
        Ok(Constraint::ObjRef {
            target,
            op: Transform::parse(op)?,
            source,
        })
    }

    /// Derive `target` as `literal - sum(coefficient * source)`.
    pub fn multi_obj(
        target: Id,
        sources: &[(Id, f64)],
        literal: f64,
    ) -> Result<Self, ConstraintError> {
        if sources.iter().any(|(id, _)| *id == target) {
            return Err(ConstraintError::SelfReference { id: target });
        }
        Ok(Constraint::MultiObj {
            target,
            sources: sources.to_vec(),
            literal,
        })
    }

    /// Whether applying the constraint writes into another object.
    pub fn is_external(&self) -> bool {
        matches!(self, Constraint::ObjRef { .. } | Constraint::MultiObj { .. })
    }

    /// The object whose value the constraint determines.
    pub fn dependent(&self) -> Id {
        match self {
            Constraint::Numeric { operand, .. } | Constraint::SelfRef { operand, .. } => *operand,
            Constraint::ObjRef { target, .. } | Constraint::MultiObj { target, .. } => *target,
        }
    }

    /// The objects the constraint reads from.
    pub fn independents(&self) -> Vec<Id> {
        match self {
            Constraint::Numeric { operand, .. } | Constraint::SelfRef { operand, .. } => {
                vec![*operand]
            }
            Constraint::ObjRef { source, .. } => vec![*source],
            Constraint::MultiObj { sources, .. } => sources.iter().map(|(id, _)| *id).collect(),
        }
    }

    /// Whether the constraint mentions `id` anywhere.
    pub fn references(&self, id: Id) -> bool {
        self.dependent() == id || self.independents().contains(&id)
    }

    /// Compute the value this constraint yields for its dependent
    ///
    /// # Arguments
    ///
    /// * `ctx` - Source of operand values
    ///
    /// # Returns
    ///
    /// For gating constraints, the operand value if the comparison holds and
    /// the bound otherwise; for external constraints, the derived value.
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> Result<f64, ConstraintError> {
        match self {
            Constraint::Numeric {
                operand,
                op,
                literal,
            } => {
                let value = ctx.raw_value(*operand)?;
                Ok(if op.holds(value, *literal) {
                    value
                } else {
                    *literal
                })
            }
            Constraint::SelfRef { operand, op, field } => {
                let value = ctx.raw_value(*operand)?;
                let bound = ctx.field_value(*operand, *field)?;
                Ok(if op.holds(value, bound) { value } else { bound })
            }
            Constraint::ObjRef { op, source, .. } => {
                let value = ctx.raw_value(*source)?;
                op.apply(value)
                    .ok_or(ConstraintError::DivisionByZero { operand: *source })
            }
            Constraint::MultiObj {
                sources, literal, ..
            } => {
                let mut total = 0.0;
                for (id, coefficient) in sources {
                    total += coefficient * ctx.raw_value(*id)?;
                }
                Ok(literal - total)
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Numeric {
                operand,
                op,
                literal,
            } => write!(f, "{operand} {op} {literal}"),
            Constraint::SelfRef { operand, op, field } => {
                write!(f, "{operand} {op} {operand}.{field}")
            }
            Constraint::ObjRef { target, op, source } => write!(f, "{target} = {op}{source}"),
            Constraint::MultiObj {
                target,
                sources,
                literal,
            } => {
                write!(f, "{target} = {literal}")?;
                for (id, coefficient) in sources {
                    write!(f, " - {coefficient}*{id}")?;
                }
                Ok(())
            }
        }
    }
}
