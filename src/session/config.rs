//! Configuration options for a session.
//!
//! This module defines how a session reacts to writes into disabled objects,
//! whether history is recorded, and how constraint registration is checked.

use serde::{Deserialize, Serialize};

/// Reaction to a user write into a disabled object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisabledWritePolicy {
    /// Fail with [`CoreError::CoreSet`](crate::error::CoreError::CoreSet)
    Strict,

    /// Drop the write and log it at debug level
    Lenient,
}

impl Default for DisabledWritePolicy {
    fn default() -> Self {
        DisabledWritePolicy::Lenient
    }
}

/// Configuration options for a [`Session`](super::Session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Reaction to writes into disabled objects. Default: Lenient
    pub on_disabled_write: DisabledWritePolicy,

    /// Whether committed changes are recorded from the start. Default: true
    pub record_history: bool,

    /// Number of undoable units kept. Default: None (unbounded)
    pub max_history: Option<usize>,

    /// Reject external constraints that would form a propagation cycle.
    /// Default: true
    pub detect_cycles: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            on_disabled_write: DisabledWritePolicy::default(),
            record_history: true,
            max_history: None,
            detect_cycles: true,
        }
    }
}

impl SessionConfig {
    /// Configuration that rejects writes into disabled objects.
    pub fn strict() -> Self {
        Self {
            on_disabled_write: DisabledWritePolicy::Strict,
            ..Self::default()
        }
    }

    /// Load a configuration from JSON. Missing keys keep their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::session::{DisabledWritePolicy, SessionConfig};
    ///
    /// let config = SessionConfig::from_json(r#"{"on_disabled_write": "Strict"}"#).unwrap();
    /// assert_eq!(config.on_disabled_write, DisabledWritePolicy::Strict);
    /// assert!(config.record_history);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
