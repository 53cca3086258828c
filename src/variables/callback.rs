//! External bindings of a value cell.
//!
//! A [`Callback`] lets an outside system own the value of a cell: the getter
//! is consulted on every read, the setter is told about every committed
//! write, and the finalizer runs once when the cell is released.

use std::fmt;

/// Error type returned by external getters and setters.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

type Getter = Box<dyn Fn() -> Result<f64, CallbackError>>;
type Setter = Box<dyn FnMut(f64) -> Result<(), CallbackError>>;
type Finalizer = Box<dyn FnOnce()>;

/// Getter/setter/finalizer triple bound to a value cell.
#[derive(Default)]
pub struct Callback {
    getter: Option<Getter>,
    setter: Option<Setter>,
    finalizer: Option<Finalizer>,
}

impl Callback {
    /// Create a callback with no hooks installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the read hook.
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::variables::callback::Callback;
    ///
    /// let cb = Callback::new().with_getter(|| Ok(4.2));
    /// assert!(cb.has_getter());
    /// ```
    pub fn with_getter<F>(mut self, getter: F) -> Self
    where
        F: Fn() -> Result<f64, CallbackError> + 'static,
    {
        self.getter = Some(Box::new(getter));
        self
    }

    /// Install the write hook.
    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: FnMut(f64) -> Result<(), CallbackError> + 'static,
    {
        self.setter = Some(Box::new(setter));
        self
    }

    /// Install the release hook.
    pub fn with_finalizer<F>(mut self, finalizer: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.finalizer = Some(Box::new(finalizer));
        self
    }

    pub fn has_getter(&self) -> bool {
        self.getter.is_some()
    }

    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    /// Read through the getter, if one is installed.
    pub(crate) fn get(&self) -> Option<Result<f64, CallbackError>> {
        self.getter.as_ref().map(|getter| getter())
    }

    /// Forward a committed value to the setter. No setter is a success.
    pub(crate) fn set(&mut self, value: f64) -> Result<(), CallbackError> {
        match self.setter.as_mut() {
            Some(setter) => setter(value),
            None => Ok(()),
        }
    }

    /// Run the finalizer at most once.
    pub(crate) fn finalize(&mut self) {
        if let Some(finalizer) = self.finalizer.take() {
            finalizer();
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("finalizer", &self.finalizer.is_some())
            .finish()
    }
}
