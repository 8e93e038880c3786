//! Error types for media operations.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while invoking the encoder.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Encoder binary not found: {0}")]
    EncoderNotFound(String),

    #[error("Encoder failed: {message}{}", format_stderr(.stderr))]
    EncoderFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Encoder produced no output at {0}")]
    EmptyOutput(PathBuf),

    #[error("Encoder timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_stderr(stderr: &Option<String>) -> String {
    match stderr {
        Some(s) if !s.trim().is_empty() => format!(": {}", s.trim()),
        _ => String::new(),
    }
}

impl MediaError {
    /// Create an encoder failure error.
    pub fn encoder_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::EncoderFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Exit code of a failed encoder run, if it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            MediaError::EncoderFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}
