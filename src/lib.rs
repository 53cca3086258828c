//! # modelcore-rs
//!
//! `modelcore-rs` is the reactive core of a scientific data-modeling library:
//! unit-aware values and fittable parameters whose changes propagate through
//! declarative constraints, with full undo/redo and read-only mirrors.
//!
//! The library provides:
//! - An identity graph of generation-counted handles with ownership edges
//! - Value cells and parameters with bounds, units and external callbacks
//! - A constraint engine that gates candidate values and derives dependents
//! - An undo/redo stack with macros
//! - Virtual mirrors that follow their source and can be realized
//!
//! ## Basic Usage
//!
//! ```
//! use modelcore_rs::constraints::Constraint;
//! use modelcore_rs::{Parameter, Session};
//!
//! let mut session = Session::new();
//! let width = session
//!     .add_parameter(Parameter::with_bounds("width", 1.0, 0.0, 10.0).unwrap(), None)
//!     .unwrap();
//! let area = session.add_parameter(Parameter::new("area", 1.0), None).unwrap();
//! session
//!     .add_constraint(width, "area_from_width", Constraint::obj_ref(area, "4*", width).unwrap())
//!     .unwrap();
//!
//! session.set_value(width, 12.0).unwrap();
//! assert_eq!(session.raw_value(width).unwrap(), 10.0);
//! assert_eq!(session.raw_value(area).unwrap(), 40.0);
//!
//! session.undo().unwrap();
//! assert_eq!(session.raw_value(area).unwrap(), 4.0);
//! ```

// Public modules
pub mod constraints;
pub mod error;
pub mod graph;
pub mod session;
pub mod undo;
pub mod variables;

// Re-exports for convenience
pub use constraints::Constraint;
pub use error::{CoreError, Result};
pub use graph::Id;
pub use session::{Session, SessionConfig};
pub use variables::{Parameter, ValueCell};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
