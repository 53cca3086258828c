//! # Variables
//!
//! Unit-aware value holders and the objects built from them.
//!
//! ## Core Components
//!
//! - [`ValueCell`]: a named magnitude with a unit, an enabled flag and
//!   optional external bindings ([`Callback`])
//! - [`Parameter`]: a value cell with [`Bounds`], an uncertainty and a fixed flag
//! - [`Composite`]: an object owning named child objects
//! - [`Unit`] and [`Quantity`]: unit parsing and conversion
//!
//! Objects are built detached and handed to a
//! [`Session`](crate::session::Session), which assigns their handles.
//!
//! ```rust
//! use modelcore_rs::session::Session;
//! use modelcore_rs::variables::Parameter;
//!
//! let mut session = Session::new();
//! let a = session
//!     .add_parameter(Parameter::with_bounds("a", 1.0, 0.0, 10.0).unwrap(), None)
//!     .unwrap();
//! session.set_value(a, 20.0).unwrap();
//! assert_eq!(session.raw_value(a).unwrap(), 10.0);
//! ```

pub mod bounds;
pub mod callback;
pub mod cell;
pub mod composite;
pub mod object;
pub mod parameter;
pub mod units;

pub use bounds::Bounds;
pub use callback::{Callback, CallbackError};
pub use cell::ValueCell;
pub use composite::Composite;
pub use object::Object;
pub use parameter::Parameter;
pub use units::{Quantity, Unit};
