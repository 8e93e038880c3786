//! Control API HTTP client.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use trackcode_models::{BatchEntry, CompletionReport, JobBatch, PresignRequest, PresignedUploadSet};

use crate::error::{QueueError, QueueResult};

/// Header carrying the shared worker secret.
pub const AUTH_HEADER: &str = "x-worker-secret";

/// Configuration for the control API client.
#[derive(Clone)]
pub struct ControlApiConfig {
    /// Base URL, e.g. `https://api.example.com`
    pub base_url: String,
    /// Shared secret
    pub secret: String,
    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ControlApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlApiConfig")
            .field("base_url", &self.base_url)
            .field("secret", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Client for the job queue / control API.
#[derive(Clone)]
pub struct ControlApiClient {
    http: Client,
    base_url: String,
    secret: String,
}

impl ControlApiClient {
    /// Create a new client.
    pub fn new(config: ControlApiConfig) -> QueueResult<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(QueueError::config("control API base URL is empty"));
        }
        if config.secret.is_empty() {
            return Err(QueueError::config("control API secret is empty"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(QueueError::Network)?;

        Ok(Self {
            http,
            base_url,
            secret: config.secret,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch up to `limit` jobs. An empty queue yields an empty vec.
    ///
    /// Only a response that is not a batch at all is an error; records that
    /// fail to decode come back as [`BatchEntry::Malformed`] in their place.
    pub async fn fetch_batch(&self, limit: usize) -> QueueResult<Vec<BatchEntry>> {
        let url = format!("{}/transcoding/queue", self.base_url);
        debug!("Fetching up to {} jobs from {}", limit, url);

        let request = self.http.get(&url).query(&[("limit", limit)]);
        let batch: JobBatch = self.send_json(request).await?;
        Ok(batch.into_entries())
    }

    /// Request a fresh set of presigned URLs for one job attempt.
    pub async fn presign(&self, request: &PresignRequest) -> QueueResult<PresignedUploadSet> {
        let url = format!("{}/transcoding/presign", self.base_url);
        debug!("Requesting presigned URLs for track {}", request.track_id);

        self.send_json(self.http.post(&url).json(request)).await
    }

    /// Report a job's outcome. The response body is ignored.
    pub async fn report(&self, report: &CompletionReport) -> QueueResult<()> {
        let url = format!("{}/transcoding/complete", self.base_url);
        debug!(
            "Reporting job {} success={}",
            report.job_id, report.success
        );

        self.send(self.http.post(&url).json(report)).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> QueueResult<Response> {
        let response = request.header(AUTH_HEADER, &self.secret).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(QueueError::from_http_status(status.as_u16(), body.trim()))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> QueueResult<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            QueueError::InvalidResponse(format!("{} ({} bytes)", e, bytes.len()))
        })
    }
}
