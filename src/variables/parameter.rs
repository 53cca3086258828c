//! Parameter definition and implementation
//!
//! A [`Parameter`] is a [`ValueCell`] that can be fitted: it carries bounds,
//! an uncertainty and a `fixed` flag. Its bounds are enforced by two builtin
//! constraints installed when the parameter is registered with a session.

use crate::constraints::{Constraint, ConstraintError, FieldRef};
use crate::error::{CoreError, Result};
use crate::graph::Id;
use crate::variables::bounds::Bounds;
use crate::variables::callback::Callback;
use crate::variables::cell::ValueCell;

/// Key of the builtin lower-bound constraint.
pub const MIN_CONSTRAINT: &str = "min";

/// Key of the builtin upper-bound constraint.
pub const MAX_CONSTRAINT: &str = "max";

/// A fittable value with bounds and uncertainty
#[derive(Debug)]
pub struct Parameter {
    pub(crate) cell: ValueCell,

    /// Minimum and maximum bounds for the parameter value
    pub(crate) bounds: Bounds,

    /// Standard error of the parameter
    pub(crate) error: f64,

    /// Whether the parameter is excluded from fitting
    pub(crate) fixed: bool,

    /// Value at construction (for reset operations)
    pub(crate) initial_value: f64,
}

impl Parameter {
    /// Create a new unbounded parameter with the given name and value
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the parameter
    /// * `value` - Initial value of the parameter
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::variables::Parameter;
    ///
    /// let param = Parameter::new("amplitude", 10.0);
    /// assert_eq!(param.name(), "amplitude");
    /// assert_eq!(param.raw_value(), 10.0);
    /// assert!(!param.fixed());
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            cell: ValueCell::new(name, value),
            bounds: Bounds::default(),
            error: 0.0,
            fixed: false,
            initial_value: value,
        }
    }

    /// Create a new parameter with the given name, value, and bounds
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the parameter
    /// * `value` - Initial value of the parameter
    /// * `min` - Minimum allowed value for the parameter
    /// * `max` - Maximum allowed value for the parameter
    ///
    /// # Returns
    ///
    /// The parameter, or an error when `min > max` or the value lies outside
    /// `[min, max]`. The value is never clamped silently.
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::variables::Parameter;
    ///
    /// let param = Parameter::with_bounds("amplitude", 10.0, 0.0, 20.0).unwrap();
    /// assert_eq!(param.min(), 0.0);
    /// assert_eq!(param.max(), 20.0);
    ///
    /// assert!(Parameter::with_bounds("amplitude", 30.0, 0.0, 20.0).is_err());
    /// ```
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self> {
        let bounds = Bounds::new(min, max)?;
        bounds.check(value)?;

        let mut param = Self::new(name, value);
        param.bounds = bounds;
        Ok(param)
    }

    /// Set the initial uncertainty. Negative or NaN errors are rejected.
    pub fn with_error(mut self, error: f64) -> Result<Self> {
        if error.is_nan() || error < 0.0 {
            return Err(CoreError::value(format!(
                "error of '{}' must be non-negative, got {error}",
                self.cell.name
            )));
        }
        self.error = error;
        Ok(self)
    }

    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Attach a unit expression.
    pub fn with_unit(mut self, unit: &str) -> Result<Self> {
        self.cell = self.cell.with_unit(unit)?;
        Ok(self)
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.cell = self.cell.with_description(description);
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.cell = self.cell.with_url(url);
        self
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.cell = self.cell.with_display_name(display_name);
        self
    }

    pub fn with_callback(mut self, callback: Callback) -> Self {
        self.cell = self.cell.with_callback(callback);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.cell = self.cell.with_enabled(enabled);
        self
    }

    /// The underlying value cell.
    pub fn cell(&self) -> &ValueCell {
        &self.cell
    }

    pub fn name(&self) -> &str {
        &self.cell.name
    }

    /// Cached value of the parameter
    pub fn raw_value(&self) -> f64 {
        self.cell.magnitude
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    /// Standard error of the parameter
    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn fixed(&self) -> bool {
        self.fixed
    }

    pub fn enabled(&self) -> bool {
        self.cell.enabled
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    /// Whether an optimizer may vary this parameter.
    pub fn is_free(&self) -> bool {
        self.cell.enabled && !self.fixed
    }

    /// Read one of the fields a self-referencing constraint can name.
    pub fn field(&self, field: FieldRef) -> f64 {
        match field {
            FieldRef::Min => self.bounds.min,
            FieldRef::Max => self.bounds.max,
        }
    }

    /// The `min`/`max` gates installed in the builtin bucket.
    pub(crate) fn builtin_constraints(
        handle: Id,
    ) -> std::result::Result<[(&'static str, Constraint); 2], ConstraintError> {
        Ok([
            (
                MIN_CONSTRAINT,
                Constraint::self_ref(handle, ">=", FieldRef::Min)?,
            ),
            (
                MAX_CONSTRAINT,
                Constraint::self_ref(handle, "<=", FieldRef::Max)?,
            ),
        ])
    }
}
