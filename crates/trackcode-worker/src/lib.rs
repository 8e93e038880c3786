//! Audio transcoding worker.
//!
//! This crate provides:
//! - The poll loop against the control API
//! - The per-job procedure (download, encode twice, upload three artifacts, report)
//! - Lifetime counters, metrics and structured logging
//! - Signal handling for immediate shutdown

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod shutdown;
pub mod stats;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{PollOutcome, Worker};
pub use logging::JobLogger;
pub use processor::JobProcessor;
pub use stats::{JobOutcome, WorkerStats};
