//! Result and error types for Steadfast.

use crate::assertion::SoftAssertionError;
use crate::classify::InteractionError;
use crate::session::SessionError;
use thiserror::Error;

/// Result type for Steadfast operations
pub type SteadfastResult<T> = Result<T, SteadfastError>;

/// Errors that can occur in Steadfast
#[derive(Debug, Error)]
pub enum SteadfastError {
    /// A classified element interaction failed and was not swallowed
    #[error(transparent)]
    Interaction(#[from] InteractionError),

    /// A session call outside of an element interaction failed
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Soft warnings were collected during the test
    #[error("{0}")]
    SoftAssertions(#[from] SoftAssertionError),

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SteadfastError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
