//! Result and error types for Esperar.

use thiserror::Error;

/// Result type for Esperar operations
pub type EsperarResult<T> = Result<T, EsperarError>;

/// Errors that can occur in Esperar
#[derive(Debug, Error)]
pub enum EsperarError {
    /// A probe raised a failure (assertion mismatch, unexpected state, ...)
    #[error("probe failed: {message}")]
    ProbeFailure {
        /// Error message
        message: String,
    },

    /// No element matched a selector
    #[error("element not found: {selector}")]
    ElementNotFound {
        /// Selector description
        selector: String,
    },

    /// Navigation error
    #[error("navigation to {app} failed: {message}")]
    NavigationError {
        /// App or URL that failed
        app: String,
        /// Error message
        message: String,
    },

    /// Retry budget exhausted; the last probe failure is attached as cause
    #[error("retry budget of {timeout_ms}ms exhausted after {attempts} attempt(s)")]
    RetryExhausted {
        /// Timeout budget in milliseconds
        timeout_ms: u64,
        /// Number of probe invocations made
        attempts: u32,
        /// Last failure observed before the deadline
        #[source]
        cause: Box<EsperarError>,
    },

    /// Retry policy rejected at validation
    #[error("invalid retry policy: {message}")]
    InvalidPolicy {
        /// Error message
        message: String,
    },

    /// The surrounding run was aborted while waiting between attempts
    #[error("retry cancelled while waiting between attempts")]
    Cancelled,

    /// Configuration key missing
    #[error("missing configuration key: {key}")]
    MissingConfig {
        /// Dotted configuration path
        key: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EsperarError {
    /// Create a probe failure from any displayable message
    #[must_use]
    pub fn probe(message: impl Into<String>) -> Self {
        Self::ProbeFailure {
            message: message.into(),
        }
    }

    /// The last probe failure, if this is an exhausted retry
    #[must_use]
    pub fn exhausted_cause(&self) -> Option<&EsperarError> {
        match self {
            Self::RetryExhausted { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Whether this error is a retry exhaustion
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }
}
