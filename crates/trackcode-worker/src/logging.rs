//! Structured logging setup and job logging utilities.

use tracing::{error, info, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trackcode_models::TranscodingJob;

/// Initialize tracing: ANSI text by default, JSON when `LOG_FORMAT=json`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "warn,trackcode_worker=info,trackcode_media=info,trackcode_storage=info,trackcode_queue=info",
        )
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    track_id: String,
    attempt: u32,
}

impl JobLogger {
    pub fn new(job: &TranscodingJob) -> Self {
        Self {
            job_id: job.job_id.to_string(),
            track_id: job.track_id.clone(),
            attempt: job.attempts,
        }
    }

    /// Log the start of a job.
    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            track_id = %self.track_id,
            attempt = self.attempt,
            "Job started: {}", message
        );
    }

    /// Log a step inside the job.
    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            track_id = %self.track_id,
            "Job progress: {}", message
        );
    }

    /// Log a job failure.
    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            track_id = %self.track_id,
            attempt = self.attempt,
            "Job failed: {}", message
        );
    }

    /// Log a job success.
    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            track_id = %self.track_id,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Span wrapping everything done for this job attempt.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            track_id = %self.track_id,
            attempt = self.attempt
        )
    }
}
