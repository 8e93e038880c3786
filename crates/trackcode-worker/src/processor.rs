//! Per-job transcoding procedure.
//!
//! One call to [`JobProcessor::process`] handles one job attempt end to end:
//! work directory, presign, download, two encodes, three parallel uploads and
//! the outcome report. Every failure is converted into a failure report; no
//! error escapes and nothing is retried within the attempt.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tempfile::TempDir;
use tracing::{error, warn, Instrument};

use trackcode_media::{AudioTarget, EncodedFile, Encoder};
use trackcode_models::{
    ArtifactKeys, ArtifactKind, CompletionReport, MalformedJob, PresignRequest,
    PresignedUploadSet, SourceFormat, TranscodingJob,
};
use trackcode_queue::ControlApiClient;
use trackcode_storage::PresignedTransfer;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::stats::JobOutcome;

/// A file ready to be PUT to its presigned URL.
struct PendingUpload<'a> {
    kind: ArtifactKind,
    path: &'a Path,
    content_type: &'a str,
}

/// Runs the per-job procedure.
pub struct JobProcessor {
    api: ControlApiClient,
    transfer: PresignedTransfer,
    encoder: Arc<dyn Encoder>,
    work_root: PathBuf,
}

impl JobProcessor {
    pub fn new(
        api: ControlApiClient,
        transfer: PresignedTransfer,
        encoder: Arc<dyn Encoder>,
        work_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api,
            transfer,
            encoder,
            work_root: work_root.into(),
        }
    }

    /// Process one job and report its outcome to the control API.
    ///
    /// The job's working directory is gone by the time this returns.
    pub async fn process(&self, job: &TranscodingJob) -> JobOutcome {
        let logger = JobLogger::new(job);
        let span = logger.create_span();

        async {
            logger.log_start(&format!("source {}", job.original_audio_key));

            let result = self.transcode(job, &logger).await;

            let report = match &result {
                Ok(keys) => CompletionReport::success(job, keys.clone()),
                Err(e) => {
                    logger.log_error(&e.to_string());
                    CompletionReport::failure(job, e.to_string())
                }
            };

            let reported = match self.api.report(&report).await {
                Ok(()) => true,
                Err(e) => {
                    metrics::record_report_error();
                    error!(
                        success = report.success,
                        "Failed to report job outcome: {}", e
                    );
                    false
                }
            };

            match result {
                Ok(_) if reported => {
                    logger.log_completion("3 artifacts uploaded");
                    metrics::record_job_succeeded();
                    JobOutcome::Succeeded
                }
                Ok(_) => {
                    metrics::record_job_failed("report");
                    JobOutcome::Failed
                }
                Err(e) => {
                    metrics::record_job_failed(e.step());
                    JobOutcome::Failed
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Fail a batch record that did not decode.
    ///
    /// Reported when its `jobId` can be recovered, otherwise only logged;
    /// the control API expires it either way.
    pub async fn reject(&self, record: &MalformedJob) -> JobOutcome {
        metrics::record_job_failed("decode");

        let Some(job_id) = record.job_id.clone() else {
            warn!("Skipping unidentifiable job record: {}", record.reason);
            return JobOutcome::Failed;
        };
        let track_id = record.track_id.clone().unwrap_or_default();
        error!(
            job_id = %job_id,
            track_id = %track_id,
            "Job failed: invalid job record: {}", record.reason
        );

        let report = CompletionReport::rejected(
            job_id,
            track_id,
            format!("invalid job record: {}", record.reason),
        );
        if let Err(e) = self.api.report(&report).await {
            metrics::record_report_error();
            error!(job_id = %report.job_id, "Failed to report job outcome: {}", e);
        }
        JobOutcome::Failed
    }

    /// Steps 1-5. The temp dir is dropped (and removed) on every return path.
    async fn transcode(
        &self,
        job: &TranscodingJob,
        logger: &JobLogger,
    ) -> WorkerResult<ArtifactKeys> {
        let work_dir = self.create_work_dir(job).await?;

        let uploads = self
            .api
            .presign(&PresignRequest::for_job(job))
            .await
            .map_err(WorkerError::PresignFailed)?;

        let format = job.source_format();
        let source = work_dir.path().join(format!("source.{}", format.extension()));

        let started = Instant::now();
        let bytes = self
            .transfer
            .download_to_file(&uploads.download_url, &source)
            .await
            .map_err(WorkerError::DownloadFailed)?;
        metrics::record_download_duration(started.elapsed().as_secs_f64());
        logger.log_progress(&format!("downloaded {} bytes", bytes));

        let streaming = self
            .encode(AudioTarget::Streaming, &source, &format, work_dir.path())
            .await?;
        logger.log_progress(&format!("streaming encode {} bytes", streaming.size_bytes));

        let hifi = self
            .encode(AudioTarget::HiFi, &source, &format, work_dir.path())
            .await?;
        logger.log_progress(&format!("hi-fi encode {} bytes", hifi.size_bytes));

        let pending = [
            PendingUpload {
                kind: ArtifactKind::Streaming,
                path: &streaming.path,
                content_type: AudioTarget::Streaming.content_type(),
            },
            PendingUpload {
                kind: ArtifactKind::Hifi,
                path: &hifi.path,
                content_type: AudioTarget::HiFi.content_type(),
            },
            PendingUpload {
                kind: ArtifactKind::Archive,
                path: &source,
                content_type: format.content_type(),
            },
        ];
        self.upload_all(&uploads, &pending).await?;

        Ok(ArtifactKeys::from_upload_set(&uploads))
    }

    async fn create_work_dir(&self, job: &TranscodingJob) -> WorkerResult<TempDir> {
        tokio::fs::create_dir_all(&self.work_root)
            .await
            .map_err(WorkerError::WorkDir)?;

        tempfile::Builder::new()
            .prefix(&format!("job-{}-", path_safe(job.job_id.as_str())))
            .tempdir_in(&self.work_root)
            .map_err(WorkerError::WorkDir)
    }

    async fn encode(
        &self,
        target: AudioTarget,
        source: &Path,
        format: &SourceFormat,
        work_dir: &Path,
    ) -> WorkerResult<EncodedFile> {
        let output = work_dir.join(format!("{}.{}", target.as_str(), target.extension()));
        let started = Instant::now();

        let encoded = self
            .encoder
            .encode(target, source, format, &output)
            .await
            .map_err(|e| WorkerError::EncodeFailed {
                target: target.as_str(),
                source: e,
            })?;

        metrics::record_encode_duration(target.as_str(), started.elapsed().as_secs_f64());
        Ok(encoded)
    }

    /// Issue all uploads at once and wait for every one to settle.
    ///
    /// Fails if any upload failed, naming each failed artifact.
    async fn upload_all(
        &self,
        set: &PresignedUploadSet,
        pending: &[PendingUpload<'_>],
    ) -> WorkerResult<()> {
        let started = Instant::now();

        let uploads = pending.iter().map(|upload| {
            let target = set.target(upload.kind);
            async move {
                let result = self
                    .transfer
                    .upload_file(&target.upload_url, upload.path, upload.content_type)
                    .await;
                (upload.kind, result)
            }
        });
        let results = futures::future::join_all(uploads).await;

        let failures: Vec<String> = results
            .into_iter()
            .filter_map(|(kind, result)| match result {
                Ok(_) => None,
                Err(e) => {
                    warn!(artifact = %kind, "Upload failed: {}", e);
                    Some(format!("{} ({})", kind, e))
                }
            })
            .collect();

        metrics::record_upload_duration(started.elapsed().as_secs_f64());

        if failures.is_empty() {
            Ok(())
        } else {
            Err(WorkerError::upload_failed(failures.join("; ")))
        }
    }
}

/// Job ids are opaque; keep only characters safe in a directory name.
fn path_safe(id: &str) -> String {
    let safe: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();
    if safe.is_empty() {
        "unknown".to_string()
    } else {
        safe
    }
}
