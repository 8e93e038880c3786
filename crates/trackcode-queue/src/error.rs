//! Control API error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    RequestFailed(String),

    #[error("Server error {0}: {1}")]
    ServerError(u16, String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl QueueError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify a non-2xx response.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => QueueError::Unauthorized(format!("HTTP {}: {}", status, body)),
            404 => QueueError::NotFound(body),
            500..=599 => QueueError::ServerError(status, body),
            _ => QueueError::RequestFailed(format!("HTTP {}: {}", status, body)),
        }
    }

    /// HTTP status code if the API answered.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            QueueError::ServerError(status, _) => Some(*status),
            QueueError::NotFound(_) => Some(404),
            QueueError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
