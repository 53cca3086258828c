//! Value cell definition
//!
//! A [`ValueCell`] is the basic unit-aware value holder. It is built detached
//! from any session and registered with [`Session::add_cell`], which assigns
//! its handle. All mutation after registration goes through the session so
//! that constraints and history are honoured.
//!
//! [`Session::add_cell`]: crate::session::Session::add_cell

use crate::constraints::ConstraintBuckets;
use crate::graph::Id;
use crate::variables::callback::Callback;
use crate::variables::units::{Quantity, Unit, UnitError};

/// A unit-aware value with optional external bindings.
#[derive(Debug)]
pub struct ValueCell {
    /// Name of the value
    pub name: String,

    /// Cached magnitude in `unit`
    pub(crate) magnitude: f64,

    pub(crate) unit: Unit,

    /// Whether user writes are accepted
    pub(crate) enabled: bool,

    /// Free-form description
    pub description: String,

    /// Documentation link
    pub url: String,

    pub(crate) display_name: Option<String>,

    pub(crate) callback: Option<Callback>,

    pub(crate) constraints: ConstraintBuckets,

    /// Source object when this cell is a virtual mirror
    pub(crate) mirror_of: Option<Id>,
}

impl ValueCell {
    /// Create a new dimensionless, enabled cell
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the value
    /// * `value` - Initial magnitude
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::variables::ValueCell;
    ///
    /// let cell = ValueCell::new("temperature", 300.0).with_unit("K").unwrap();
    /// assert_eq!(cell.raw_value(), 300.0);
    /// assert_eq!(cell.unit().symbol(), "K");
    /// assert!(cell.enabled());
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            magnitude: value,
            unit: Unit::dimensionless(),
            enabled: true,
            description: String::new(),
            url: String::new(),
            display_name: None,
            callback: None,
            constraints: ConstraintBuckets::new(),
            mirror_of: None,
        }
    }

    /// Attach a unit expression such as `"angstrom"` or `"m/s"`.
    pub fn with_unit(mut self, unit: &str) -> Result<Self, UnitError> {
        self.unit = Unit::parse(unit)?;
        Ok(self)
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    /// Bind the cell to an external getter/setter.
    pub fn with_callback(mut self, callback: Callback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Cached magnitude, without consulting any external getter.
    pub fn raw_value(&self) -> f64 {
        self.magnitude
    }

    /// Cached magnitude paired with the unit.
    pub fn quantity(&self) -> Quantity {
        Quantity::new(self.magnitude, self.unit.clone())
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Display name, falling back to the plain name.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn constraints(&self) -> &ConstraintBuckets {
        &self.constraints
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Source object of a virtual mirror.
    pub fn mirror_of(&self) -> Option<Id> {
        self.mirror_of
    }

    pub fn is_virtual(&self) -> bool {
        self.mirror_of.is_some()
    }

    /// Copy every plain field; callback and constraints are left behind.
    pub(crate) fn detached_copy(&self) -> ValueCell {
        ValueCell {
            name: self.name.clone(),
            magnitude: self.magnitude,
            unit: self.unit.clone(),
            enabled: self.enabled,
            description: self.description.clone(),
            url: self.url.clone(),
            display_name: self.display_name.clone(),
            callback: None,
            constraints: ConstraintBuckets::new(),
            mirror_of: None,
        }
    }
}
