//! Parameter bounds implementation
//!
//! This module provides the closed interval `[min, max]` a parameter's value
//! must stay within. Infinite endpoints stand for "unbounded" and serialize
//! as `null`.

use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must not exceed max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },
}

/// Closed interval a parameter's value must stay within.
///
/// In serialized form each endpoint is an optional number; a missing or
/// `null` endpoint is unbounded. Deserialization rejects `min > max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "Limits", try_from = "Limits")]
pub struct Bounds {
    /// Lower endpoint, `-inf` when unbounded
    pub min: f64,

    /// Upper endpoint, `+inf` when unbounded
    pub max: f64,
}

/// Serialized form of [`Bounds`].
#[derive(Serialize, Deserialize)]
struct Limits {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

impl From<Bounds> for Limits {
    fn from(bounds: Bounds) -> Self {
        Self {
            min: bounds.min.is_finite().then_some(bounds.min),
            max: bounds.max.is_finite().then_some(bounds.max),
        }
    }
}

impl TryFrom<Limits> for Bounds {
    type Error = BoundsError;

    fn try_from(limits: Limits) -> Result<Self, Self::Error> {
        Bounds::new(
            limits.min.unwrap_or(NEG_INFINITY),
            limits.max.unwrap_or(INFINITY),
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create new bounds with min and max values
    ///
    /// # Arguments
    ///
    /// * `min` - Minimum allowed value
    /// * `max` - Maximum allowed value
    ///
    /// # Returns
    ///
    /// A new `Bounds` object if min <= max, or an error otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::variables::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.min, 0.0);
    /// assert_eq!(bounds.max, 10.0);
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min > max || min.is_nan() || max.is_nan() {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Check if a value is within the bounds
    ///
    /// # Arguments
    ///
    /// * `value` - Value to check
    ///
    /// # Returns
    ///
    /// `true` if `min <= value <= max`; NaN is never within bounds
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Ensure a value lies within the bounds
    pub fn check(&self, value: f64) -> Result<(), BoundsError> {
        if self.is_within_bounds(value) {
            Ok(())
        } else {
            Err(BoundsError::ValueOutsideBounds {
                value,
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Multiply both endpoints by a positive unit conversion factor.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            min: self.min * factor,
            max: self.max * factor,
        }
    }
}
