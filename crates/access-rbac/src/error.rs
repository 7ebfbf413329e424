//! Error types for access control operations
//!
//! This module defines the errors raised while loading the item hierarchy,
//! resolving permissions, and talking to the assignment store.

use thiserror::Error;

use crate::store::StoreError;

/// Access control error types.
///
/// Configuration errors are fatal at startup. Unknown item names are
/// resolved as a deny by the resolver and only surface as `NotFound`
/// where a caller must tell "unknown" apart from "denied".
#[derive(Debug, Error)]
pub enum RbacError {
    /// Missing or malformed item definition, or missing required configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown role or permission name
    #[error("Unknown item: {0}")]
    NotFound(String),

    /// Assignment store failure unrelated to uniqueness conflicts
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// A rule attached to an item failed to evaluate
    #[error("Rule for '{item}' failed: {message}")]
    Rule {
        /// Name of the item carrying the rule.
        item: String,
        /// Failure reported by the rule.
        message: String,
    },

    /// Definition file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Definition file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type for access control operations.
pub type RbacResult<T> = Result<T, RbacError>;

impl RbacError {
    /// Check if this error should be logged at error level.
    ///
    /// Unknown names are expected during normal operation and
    /// should not be logged as errors.
    pub fn is_server_error(&self) -> bool {
        !matches!(self, RbacError::NotFound(_))
    }

    /// Get error code for API and CLI responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            RbacError::Configuration(_) => "CONFIG_ERROR",
            RbacError::NotFound(_) => "NOT_FOUND",
            RbacError::Persistence(_) => "PERSISTENCE_ERROR",
            RbacError::Rule { .. } => "RULE_ERROR",
            RbacError::Io(_) => "IO_ERROR",
            RbacError::Parse(_) => "PARSE_ERROR",
        }
    }
}

impl From<serde_json::Error> for RbacError {
    fn from(err: serde_json::Error) -> Self {
        RbacError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for RbacError {
    fn from(err: serde_yaml::Error) -> Self {
        RbacError::Parse(err.to_string())
    }
}
