//! Poll loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use trackcode_media::Encoder;
use trackcode_models::BatchEntry;
use trackcode_queue::{ControlApiClient, ControlApiConfig};
use trackcode_storage::{PresignedTransfer, TransferConfig};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::metrics;
use crate::processor::JobProcessor;
use crate::stats::WorkerStats;

/// What one poll cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The queue had nothing for us
    Idle,
    /// This many jobs were processed, in order
    Processed(usize),
    /// The batch fetch failed; nothing was processed
    QueueUnavailable,
}

/// Sequential transcoding worker: one job at a time, forever.
pub struct Worker {
    config: WorkerConfig,
    api: ControlApiClient,
    processor: JobProcessor,
    stats: WorkerStats,
    worker_id: String,
}

impl Worker {
    /// Create a worker from configuration and an encoder.
    pub fn new(config: WorkerConfig, encoder: Arc<dyn Encoder>) -> WorkerResult<Self> {
        let api = ControlApiClient::new(ControlApiConfig {
            base_url: config.api_base_url.clone(),
            secret: config.api_secret.clone(),
            timeout: config.api_timeout,
        })?;

        let transfer = PresignedTransfer::new(TransferConfig {
            timeout: config.transfer_timeout,
            ..TransferConfig::default()
        })?;

        let processor = JobProcessor::new(api.clone(), transfer, encoder, &config.work_dir);

        Ok(Self {
            config,
            api,
            processor,
            stats: WorkerStats::new(),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        })
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Fetch one batch and process it sequentially in the order returned.
    ///
    /// Never fails: a fetch error is logged and reported as
    /// [`PollOutcome::QueueUnavailable`]. A record that does not decode is
    /// failed on its own; the rest of the batch still runs.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let entries = match self.api.fetch_batch(self.config.batch_size).await {
            Ok(entries) => entries,
            Err(e) => {
                metrics::record_queue_fetch_error();
                warn!(
                    worker_id = %self.worker_id,
                    "Failed to fetch jobs, retrying in {:?}: {}", self.config.poll_interval, e
                );
                return PollOutcome::QueueUnavailable;
            }
        };

        if entries.is_empty() {
            debug!("No pending jobs");
            return PollOutcome::Idle;
        }

        let count = entries.len();
        info!(worker_id = %self.worker_id, "Fetched {} jobs", count);

        for entry in &entries {
            let outcome = match entry {
                BatchEntry::Job(job) => self.processor.process(job).await,
                BatchEntry::Malformed(record) => self.processor.reject(record).await,
            };
            self.stats.record(outcome);
        }

        PollOutcome::Processed(count)
    }

    /// Delay before the next poll. A full batch means there may be more
    /// waiting, so poll again right away.
    pub fn next_delay(&self, outcome: PollOutcome) -> Duration {
        match outcome {
            PollOutcome::Processed(n) if n >= self.config.batch_size => Duration::ZERO,
            _ => self.config.poll_interval,
        }
    }

    async fn cycle(&mut self) {
        let outcome = self.poll_once().await;
        let delay = self.next_delay(outcome);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Poll until `shutdown` resolves, then log final counters and return.
    ///
    /// An in-flight job is abandoned, not drained: its work directory is
    /// dropped and any encoder child is killed. The control API requeues it.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            worker_id = %self.worker_id,
            api = %self.api.base_url(),
            batch_size = self.config.batch_size,
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Starting poll loop"
        );

        tokio::pin!(shutdown);
        let mut next_report = Instant::now() + self.config.stats_interval;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(worker_id = %self.worker_id, "Shutdown signal received, abandoning in-flight work");
                    break;
                }
                _ = self.cycle() => {}
            }

            if Instant::now() >= next_report {
                self.stats.log_summary(&self.worker_id, "periodic");
                next_report = Instant::now() + self.config.stats_interval;
            }
        }

        self.stats.log_summary(&self.worker_id, "shutdown");
    }
}
