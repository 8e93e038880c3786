//! Prometheus metrics for the worker.

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with an HTTP listener on `port`.
///
/// Without this call every record below goes to the no-op recorder.
pub fn init_metrics(port: u16) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
        .install()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_PROCESSED_TOTAL: &str = "trackcode_jobs_processed_total";
    pub const JOBS_SUCCEEDED_TOTAL: &str = "trackcode_jobs_succeeded_total";
    pub const JOBS_FAILED_TOTAL: &str = "trackcode_jobs_failed_total";
    pub const QUEUE_FETCH_ERRORS_TOTAL: &str = "trackcode_queue_fetch_errors_total";
    pub const REPORT_ERRORS_TOTAL: &str = "trackcode_report_errors_total";

    pub const ENCODE_DURATION_SECONDS: &str = "trackcode_encode_duration_seconds";
    pub const DOWNLOAD_DURATION_SECONDS: &str = "trackcode_download_duration_seconds";
    pub const UPLOAD_DURATION_SECONDS: &str = "trackcode_upload_duration_seconds";
}

pub fn record_job_succeeded() {
    counter!(names::JOBS_PROCESSED_TOTAL).increment(1);
    counter!(names::JOBS_SUCCEEDED_TOTAL).increment(1);
}

/// Record a failed job, labelled by the step that failed.
pub fn record_job_failed(step: &str) {
    let labels = [("step", step.to_string())];
    counter!(names::JOBS_PROCESSED_TOTAL).increment(1);
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_queue_fetch_error() {
    counter!(names::QUEUE_FETCH_ERRORS_TOTAL).increment(1);
}

pub fn record_report_error() {
    counter!(names::REPORT_ERRORS_TOTAL).increment(1);
}

pub fn record_encode_duration(target: &str, duration_secs: f64) {
    let labels = [("target", target.to_string())];
    histogram!(names::ENCODE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_download_duration(duration_secs: f64) {
    histogram!(names::DOWNLOAD_DURATION_SECONDS).record(duration_secs);
}

pub fn record_upload_duration(duration_secs: f64) {
    histogram!(names::UPLOAD_DURATION_SECONDS).record(duration_secs);
}
