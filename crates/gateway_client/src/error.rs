//! Gateway error types

use thiserror::Error;

/// Errors that can occur while talking to the model gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure (connection refused, DNS, TLS, timeout)
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Gateway answered with a non-success HTTP status
    #[error("Gateway returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated by the caller where needed
        body: String,
    },

    /// Credentials were rejected by the token endpoint or the API
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Response body could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No deployment serves the requested model
    #[error("No deployment serves model {model}")]
    DeploymentNotFound {
        /// The logical model name that was looked up
        model: String,
    },

    /// A deployment exists for the model but is not running yet
    #[error("Deployment {id} is not ready (status: {status})")]
    DeploymentNotReady {
        /// Deployment identifier
        id: String,
        /// Current lifecycle status
        status: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying (if provided by the gateway)
        retry_after_secs: Option<u64>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// Returns true if this error is retryable
    ///
    /// Non-success HTTP statuses are transient from the caller's point of
    /// view; transport failures, credential rejections, and parse errors
    /// abort immediately. A not-yet-running deployment is retryable so that
    /// callers can poll until it comes up.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::RateLimited { .. } | Self::DeploymentNotReady { .. }
        )
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::Transport(format!("connection failed: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}
