//! Worker error types.

use thiserror::Error;
use trackcode_media::MediaError;
use trackcode_queue::QueueError;
use trackcode_storage::StorageError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Work directory error: {0}")]
    WorkDir(#[source] std::io::Error),

    #[error("Presign request failed: {0}")]
    PresignFailed(#[source] QueueError),

    #[error("Download failed: {0}")]
    DownloadFailed(#[source] StorageError),

    #[error("{target} encode failed: {source}")]
    EncodeFailed {
        target: &'static str,
        #[source]
        source: MediaError,
    },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    /// Pipeline step that failed, used as a metrics label.
    pub fn step(&self) -> &'static str {
        match self {
            WorkerError::ConfigError(_) => "config",
            WorkerError::WorkDir(_) => "work_dir",
            WorkerError::PresignFailed(_) => "presign",
            WorkerError::DownloadFailed(_) => "download",
            WorkerError::EncodeFailed { .. } => "encode",
            WorkerError::UploadFailed(_) => "upload",
            WorkerError::Queue(_) => "queue",
            WorkerError::Storage(_) => "storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_encode_failure_names_target() {
        let err = WorkerError::EncodeFailed {
            target: "streaming",
            source: MediaError::Timeout(Duration::from_secs(1800)),
        };
        assert_eq!(
            err.to_string(),
            "streaming encode failed: Encoder timed out after 1800s"
        );
        assert_eq!(err.step(), "encode");
    }

    #[test]
    fn test_presign_failure_message() {
        let err = WorkerError::PresignFailed(QueueError::from_http_status(503, "maintenance"));
        assert!(err.to_string().starts_with("Presign request failed"));
        assert_eq!(err.step(), "presign");
    }
}
