//! Result and error types for inline field page objects.

use thiserror::Error;

/// Result type for inline field operations
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors that can occur while driving an inline field
#[derive(Debug, Error)]
pub enum FieldError {
    /// A required selector matched nothing
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector that matched nothing
        selector: String,
    },

    /// A state, content or value check did not hold within its timeout
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// The editor did not open, or did not settle in the expected state
    #[error("Activation failed: {message}")]
    ActivationFailed {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Browser backend error
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FieldError {
    /// Build an `ElementNotFound` error
    #[must_use]
    pub fn not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// Build an `AssertionFailed` error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Build an `ActivationFailed` error
    #[must_use]
    pub fn activation(message: impl Into<String>) -> Self {
        Self::ActivationFailed {
            message: message.into(),
        }
    }

    /// Build a `Driver` error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Whether the bounded retry should re-attempt after this error.
    ///
    /// Only activation races are retried. A missing element is a structural
    /// mismatch and surfaces immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ActivationFailed { .. })
    }

    /// Whether this error means "the element is not on the page"
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}
