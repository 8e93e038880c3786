//! Worker configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Clone)]
pub struct WorkerConfig {
    /// Control API base URL
    pub api_base_url: String,
    /// Shared secret for the control API
    pub api_secret: String,
    /// Wait after an empty or failed poll
    pub poll_interval: Duration,
    /// Jobs requested per poll
    pub batch_size: usize,
    /// Parent directory for per-job temp dirs
    pub work_dir: PathBuf,
    /// Encoder binary
    pub encoder_path: PathBuf,
    /// Timeout per encoder invocation
    pub encode_timeout: Duration,
    /// Timeout per control API request
    pub api_timeout: Duration,
    /// Timeout per download or upload
    pub transfer_timeout: Duration,
    /// How often lifetime counters are logged
    pub stats_interval: Duration,
    /// Prometheus listener port (disabled when unset)
    pub metrics_port: Option<u16>,
}

impl WorkerConfig {
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
    pub const DEFAULT_BATCH_SIZE: usize = 3;

    /// Config with the two required values and defaults for the rest.
    pub fn new(api_base_url: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_secret: api_secret.into(),
            poll_interval: Duration::from_secs(Self::DEFAULT_POLL_INTERVAL_SECS),
            batch_size: Self::DEFAULT_BATCH_SIZE,
            work_dir: std::env::temp_dir().join("trackcode"),
            encoder_path: PathBuf::from("ffmpeg"),
            encode_timeout: Duration::from_secs(1800), // 30 minutes
            api_timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(1800),
            stats_interval: Duration::from_secs(300),
            metrics_port: None,
        }
    }

    /// Create config from environment variables.
    ///
    /// Fails if `TRANSCODE_API_URL` or `TRANSCODE_API_SECRET` is missing.
    pub fn from_env() -> WorkerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> WorkerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| WorkerError::config_error(format!("{} not set", key)))
        };
        let secs = |key: &str, default: u64| {
            Duration::from_secs(
                lookup(key)
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(default),
            )
        };

        let mut config = Self::new(
            required("TRANSCODE_API_URL")?,
            required("TRANSCODE_API_SECRET")?,
        );

        config.poll_interval = secs("POLL_INTERVAL_SECS", Self::DEFAULT_POLL_INTERVAL_SECS);
        config.batch_size = lookup("BATCH_SIZE")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(Self::DEFAULT_BATCH_SIZE)
            .max(1);
        if let Some(dir) = lookup("WORKER_WORK_DIR").filter(|s| !s.trim().is_empty()) {
            config.work_dir = PathBuf::from(dir.trim());
        }
        if let Some(path) = lookup("FFMPEG_PATH").filter(|s| !s.trim().is_empty()) {
            config.encoder_path = PathBuf::from(path.trim());
        }
        config.encode_timeout = secs("ENCODE_TIMEOUT_SECS", 1800);
        config.api_timeout = secs("API_TIMEOUT_SECS", 30);
        config.transfer_timeout = secs("TRANSFER_TIMEOUT_SECS", 1800);
        config.stats_interval = secs("STATS_INTERVAL_SECS", 300);
        config.metrics_port = lookup("METRICS_PORT").and_then(|s| s.trim().parse().ok());

        Ok(config)
    }
}

impl fmt::Debug for WorkerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_secret", &"<redacted>")
            .field("poll_interval", &self.poll_interval)
            .field("batch_size", &self.batch_size)
            .field("work_dir", &self.work_dir)
            .field("encoder_path", &self.encoder_path)
            .field("encode_timeout", &self.encode_timeout)
            .field("api_timeout", &self.api_timeout)
            .field("transfer_timeout", &self.transfer_timeout)
            .field("stats_interval", &self.stats_interval)
            .field("metrics_port", &self.metrics_port)
            .finish()
    }
}
