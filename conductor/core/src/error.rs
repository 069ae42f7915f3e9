//! Error Types
//!
//! `SubmitError` covers submissions the Conductor refuses; `ResolutionError`
//! covers everything that can go wrong inside a resolution backend. Neither
//! escapes the Conductor as a panic or a propagated error: rejected submits
//! are no-ops and resolution failures become [`OrchestratorState::Failed`].
//!
//! [`OrchestratorState::Failed`]: crate::messages::OrchestratorState::Failed

use thiserror::Error;

/// Why a submission was not accepted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Citation text was empty or whitespace-only
    #[error("citation text is empty")]
    EmptyCitation,

    /// Another resolution is still in flight
    #[error("a resolution is already in progress")]
    AlreadyLoading,
}

/// Failure reported by a resolution backend
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// Could not reach the service
    #[error("Network error: {0}")]
    Network(String),

    /// The request timed out
    #[error("The resolution service did not respond in time")]
    Timeout,

    /// Service quota or rate limit exhausted
    #[error("Service quota exceeded: {0}")]
    Quota(String),

    /// Service answered with a non-success status
    #[error("Service returned {status}{}", body_suffix(.body))]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Response body (may be empty)
        body: String,
    },

    /// Service answered with something we could not interpret
    #[error("Malformed response from service: {0}")]
    MalformedResponse(String),

    /// Backend is missing required configuration
    #[error("Backend misconfigured: {0}")]
    Configuration(String),

    /// Failure without any usable description
    #[error("unknown resolution failure")]
    Unknown,
}

impl ResolutionError {
    /// Message to show the user, or `None` if the error carries no description
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Unknown => None,
            Self::Network(msg) | Self::Quota(msg) | Self::MalformedResponse(msg)
                if msg.trim().is_empty() =>
            {
                None
            }
            other => Some(other.to_string()),
        }
    }
}

fn body_suffix(body: &str) -> String {
    if body.trim().is_empty() {
        String::new()
    } else {
        format!(": {}", body.trim())
    }
}

impl From<reqwest::Error> for ResolutionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Upstream {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ResolutionError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}
