//! Process-lifetime job counters.
//!
//! Only read for self-reporting; they never affect control flow. The poll
//! loop is the single writer, so plain fields suffice.

use chrono::{DateTime, Utc};
use tracing::info;

/// Result of one per-job procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct WorkerStats {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub started_at: DateTime<Utc>,
}

impl Default for WorkerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerStats {
    pub fn new() -> Self {
        Self {
            processed: 0,
            succeeded: 0,
            failed: 0,
            started_at: Utc::now(),
        }
    }

    pub fn record(&mut self, outcome: JobOutcome) {
        self.processed += 1;
        match outcome {
            JobOutcome::Succeeded => self.succeeded += 1,
            JobOutcome::Failed => self.failed += 1,
        }
    }

    /// Log the counters with a short reason (`periodic`, `shutdown`).
    pub fn log_summary(&self, worker_id: &str, reason: &str) {
        let uptime = Utc::now().signed_duration_since(self.started_at);
        info!(
            worker_id,
            reason,
            processed = self.processed,
            succeeded = self.succeeded,
            failed = self.failed,
            uptime_secs = uptime.num_seconds(),
            "Worker stats: {} processed, {} succeeded, {} failed",
            self.processed,
            self.succeeded,
            self.failed
        );
    }
}
