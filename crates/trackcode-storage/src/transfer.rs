//! Presigned URL transfers.

use std::path::Path;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Response};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};

/// Configuration for the transfer client.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Whole-request timeout for a single download or upload
    pub timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1800),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for presigned object storage URLs.
///
/// Presigned URLs carry their own credentials, so no auth header is sent.
#[derive(Clone)]
pub struct PresignedTransfer {
    http: Client,
}

impl PresignedTransfer {
    /// Create a new transfer client.
    pub fn new(config: TransferConfig) -> StorageResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| StorageError::config_error(e.to_string()))?;

        Ok(Self { http })
    }

    /// Stream the object at `url` into `path`.
    ///
    /// Any non-2xx status or an empty body is an error; a partially
    /// written file is removed before returning.
    pub async fn download_to_file(&self, url: &str, path: impl AsRef<Path>) -> StorageResult<u64> {
        let path = path.as_ref();
        let started = Instant::now();
        debug!("Downloading {} to {}", redact(url), path.display());

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(without_url)?;
        let response = check_status(response).await?;
        let expected = response.content_length();

        let result = write_body(response, path).await;
        let written = match result {
            Ok(written) => written,
            Err(e) => {
                remove_partial(path).await;
                return Err(e);
            }
        };

        if written == 0 {
            remove_partial(path).await;
            return Err(StorageError::download_failed(format!(
                "empty body from {}",
                redact(url)
            )));
        }
        if let Some(expected) = expected {
            if expected != written {
                remove_partial(path).await;
                return Err(StorageError::download_failed(format!(
                    "expected {} bytes, received {}",
                    expected, written
                )));
            }
        }

        info!(
            bytes = written,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Downloaded {} to {}",
            redact(url),
            path.display()
        );
        Ok(written)
    }

    /// PUT the file at `path` to `url` with the given content type.
    pub async fn upload_file(
        &self,
        url: &str,
        path: impl AsRef<Path>,
        content_type: &str,
    ) -> StorageResult<u64> {
        let path = path.as_ref();
        let started = Instant::now();

        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        debug!("Uploading {} ({} bytes) to {}", path.display(), len, redact(url));

        let response = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, len)
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .map_err(without_url)?;
        check_status(response).await?;

        info!(
            bytes = len,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Uploaded {} to {}",
            path.display(),
            redact(url)
        );
        Ok(len)
    }
}

async fn check_status(response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Status {
        status: status.as_u16(),
        body: truncate(body.trim(), 500),
    })
}

async fn write_body(response: Response, path: &Path) -> StorageResult<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(without_url)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove partial download {}: {}", path.display(), e);
        }
    }
}

/// Network errors embed the request URL; keep presigned credentials out of them.
fn without_url(e: reqwest::Error) -> StorageError {
    StorageError::Network(e.without_url())
}

/// Strip the query string, which holds the presigned credentials.
pub fn redact(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transfer() -> PresignedTransfer {
        PresignedTransfer::new(TransferConfig {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test]
    fn test_redact_strips_signature() {
        assert_eq!(
            redact("https://bucket.example/key.wav?X-Amz-Signature=abc"),
            "https://bucket.example/key.wav"
        );
        assert_eq!(redact("https://bucket.example/key"), "https://bucket.example/key");
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/originals/track.wav"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFF....WAVE".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("source.wav");
        let url = format!("{}/originals/track.wav?sig=1", server.uri());

        let written = transfer().download_to_file(&url, &dest).await.unwrap();
        assert_eq!(written, 12);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"RIFF....WAVE");
    }

    #[tokio::test]
    async fn test_download_non_success_fails_without_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("NoSuchKey"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("source.wav");

        let err = transfer()
            .download_to_file(&format!("{}/missing", server.uri()), &dest)
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), Some(404));
        assert!(err.to_string().contains("NoSuchKey"));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_empty_body_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("source.flac");

        let err = transfer()
            .download_to_file(&format!("{}/empty", server.uri()), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DownloadFailed(_)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_upload_sends_content_type_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/hifi.flac"))
            .and(header("content-type", "audio/flac"))
            .and(body_bytes(b"fLaC-data".to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("hifi.flac");
        tokio::fs::write(&file, b"fLaC-data").await.unwrap();

        let sent = transfer()
            .upload_file(&format!("{}/hifi.flac", server.uri()), &file, "audio/flac")
            .await
            .unwrap();
        assert_eq!(sent, 9);
    }

    #[tokio::test]
    async fn test_upload_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("SignatureDoesNotMatch"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("streaming.m4a");
        tokio::fs::write(&file, b"aac").await.unwrap();

        let err = transfer()
            .upload_file(&format!("{}/s.m4a", server.uri()), &file, "audio/mp4")
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), Some(403));
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = transfer()
            .upload_file("http://127.0.0.1:9/x", dir.path().join("nope"), "audio/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
