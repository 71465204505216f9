//! Provider error types.
//!
//! Every provider converts its internal faults into a [`ProviderError`]
//! before returning, so the orchestrator only ever sees offers or one of
//! these variants.

use thiserror::Error;

/// Error type for a single provider search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider did not answer in time.
    #[error("provider timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// The provider could not be reached.
    #[error("provider connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// The provider answered with an error.
    #[error("provider upstream error: {message}")]
    Upstream {
        /// Error message.
        message: String,
        /// HTTP status, when the error came from a response.
        status: Option<u16>,
    },

    /// The provider response could not be understood.
    #[error("provider response could not be parsed: {message}")]
    Parse {
        /// Error message.
        message: String,
    },

    /// The provider is misconfigured.
    #[error("provider configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },
}

impl ProviderError {
    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an upstream error without a status code.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            status: None,
        }
    }

    /// Creates an upstream error carrying the HTTP status.
    pub fn upstream_status(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns true for timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_connect() {
            Self::connection(error.to_string())
        } else if error.is_decode() {
            Self::parse(error.to_string())
        } else if let Some(status) = error.status() {
            Self::upstream_status(status.as_u16(), error.to_string())
        } else {
            Self::upstream(error.to_string())
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
