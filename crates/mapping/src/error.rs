//! Error types for the mapping engine
//!
//! Structural mapping problems, failed mandatory lookups and write-once
//! violations each get their own variant so callers can tell a bad domain
//! declaration apart from a caller defect.

use crate::config::ConfigError;
use thiserror::Error;

/// Result type alias for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;

/// Error types for mapping construction and lookup
#[derive(Debug, Error)]
pub enum MappingError {
    /// The declared shape of a class, property or relation violates a mapping rule
    #[error("{0}")]
    Configuration(String),

    /// A `get_mandatory_*` lookup did not find its key
    #[error("{0}")]
    NotFound(String),

    /// A write-once slot was assigned a second time
    #[error("{0}")]
    AlreadySet(String),

    /// The finished mapping failed one or more validation rules
    #[error("The mapping is invalid:\n{}", .0.join("\n"))]
    Validation(Vec<String>),

    /// The reflected input could not be interpreted
    #[error("Reflection error: {0}")]
    Reflection(String),

    /// Mapping configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Declarations could not be deserialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MappingError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn already_set(message: impl Into<String>) -> Self {
        Self::AlreadySet(message.into())
    }

    /// True for failed mandatory lookups
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for structural mapping errors, including accumulated validation failures
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Validation(_))
    }

    /// True when the caller assigned a write-once value twice
    pub fn is_programming_error(&self) -> bool {
        matches!(self, Self::AlreadySet(_))
    }
}

impl From<serde_json::Error> for MappingError {
    fn from(err: serde_json::Error) -> Self {
        MappingError::Serialization(err.to_string())
    }
}
