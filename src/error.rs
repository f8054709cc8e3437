//! Router Error Types
//!
//! Error taxonomy for configuration loading, provider selection and outbound calls.

use thiserror::Error;

/// Main error type for routing operations
#[derive(Debug, Error)]
pub enum RouterError {
    /// Malformed or inconsistent configuration
    ///
    /// Missing providers, duplicate ids, invalid weights or an unreadable source.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No provider could be selected for the requested model
    #[error("Selection error: {0}")]
    Selection(String),

    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    Request(String),

    /// HTTP request exceeded its timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Backend answered with a non-success status
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RouterError {
    /// Build a configuration error from anything displayable
    pub fn config(msg: impl Into<String>) -> Self {
        RouterError::Configuration(msg.into())
    }

    /// Whether this error was raised while loading configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, RouterError::Configuration(_))
    }

    /// Whether this error was raised while selecting a provider
    pub fn is_selection(&self) -> bool {
        matches!(self, RouterError::Selection(_))
    }
}

impl From<reqwest::Error> for RouterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RouterError::Timeout(err.to_string())
        } else if err.is_connect() {
            RouterError::Request(format!("Connection failed: {}", err))
        } else {
            RouterError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RouterError {
    fn from(err: serde_json::Error) -> Self {
        RouterError::Configuration(format!("JSON parsing error: {}", err))
    }
}

impl From<std::io::Error> for RouterError {
    fn from(err: std::io::Error) -> Self {
        RouterError::Configuration(format!("IO error: {}", err))
    }
}

/// Result type alias for routing operations
pub type Result<T> = std::result::Result<T, RouterError>;
