//! Error types for bounty-gateway.

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by gateway components.
///
/// Every handler converts these into a JSON error body at its own boundary;
/// [`Error::status_code`] decides the transport status.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Request failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// Requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record with the same id already exists, or a status change is illegal.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database or cache failure. Carries the downstream message when one exists.
    #[error("{0}")]
    Store(String),

    /// Verifier, oracle, profile or blob service failure.
    #[error("{0}")]
    Upstream(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Outbound HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Transport status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Config(_)
            | Self::Store(_)
            | Self::Upstream(_)
            | Self::Io(_)
            | Self::Http(_)
            | Self::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds a store error, falling back to a generic message when the
    /// downstream one is empty.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::Store("store request failed".to_string())
        } else {
            Self::Store(message)
        }
    }
}
