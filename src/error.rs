use crate::constraints::ConstraintError;
use crate::graph::GraphError;
use crate::undo::UndoError;
use crate::variables::bounds::BoundsError;
use crate::variables::units::UnitError;
use thiserror::Error;

/// Error types for the modelcore-rs library.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Handle or graph lookup failure.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A value was rejected by a construction-time or setter check.
    #[error("Value error: {0}")]
    ValueError(String),

    /// A write was refused because the target is disabled, or an external
    /// setter callback failed after the cache was updated.
    #[error("Cannot set '{name}': {reason}")]
    CoreSet { name: String, reason: String },

    /// Mutating a read-only mirror.
    #[error("'{name}' is a virtual mirror and cannot be modified this way")]
    VirtualImmutable { name: String },

    /// Error for boundary violations.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// Unit parsing or conversion failure.
    #[error("Unit error: {0}")]
    Unit(#[from] UnitError),

    /// Constraint construction, registration or evaluation failure.
    #[error("Constraint error: {0}")]
    Constraint(#[from] ConstraintError),

    /// Macro bookkeeping failure.
    #[error("Undo error: {0}")]
    Undo(#[from] UndoError),

    /// The object behind a handle has the wrong shape for the operation.
    #[error("Object '{name}' is not a {expected}")]
    WrongKind { name: String, expected: &'static str },

    /// Composite has no field of the given name.
    #[error("Composite '{name}' has no field '{field}'")]
    UnknownField { name: String, field: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for modelcore-rs operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Shorthand for a [`CoreError::ValueError`].
    pub fn value(message: impl Into<String>) -> Self {
        CoreError::ValueError(message.into())
    }

    /// Returns true for errors caused by an unknown handle or graph name.
    pub fn is_lookup(&self) -> bool {
        matches!(self, CoreError::Graph(_))
    }
}
