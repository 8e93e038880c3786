//! Job outcome reports sent back to the control API.

use serde::{Deserialize, Serialize};

use crate::{ArtifactKind, JobId, PresignedUploadSet, TranscodingJob};

/// Storage keys of the three committed artifacts.
///
/// Only constructible as a complete set, so a success report always
/// names all three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKeys {
    pub streaming: String,
    pub hifi: String,
    pub archive: String,
}

impl ArtifactKeys {
    pub fn from_upload_set(set: &PresignedUploadSet) -> Self {
        Self {
            streaming: set.target(ArtifactKind::Streaming).key.clone(),
            hifi: set.target(ArtifactKind::Hifi).key.clone(),
            archive: set.target(ArtifactKind::Archive).key.clone(),
        }
    }
}

/// Body of the report-outcome call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub job_id: JobId,
    pub track_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_audio_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hifi_audio_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_audio_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_audio_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompletionReport {
    /// Success report carrying all three keys and the echoed original key.
    pub fn success(job: &TranscodingJob, keys: ArtifactKeys) -> Self {
        Self {
            job_id: job.job_id.clone(),
            track_id: job.track_id.clone(),
            success: true,
            streaming_audio_key: Some(keys.streaming),
            hifi_audio_key: Some(keys.hifi),
            archive_audio_key: Some(keys.archive),
            original_audio_key: Some(job.original_audio_key.clone()),
            error: None,
        }
    }

    /// Failure report. An empty message is replaced so the control API
    /// always receives something to show.
    pub fn failure(job: &TranscodingJob, error: impl Into<String>) -> Self {
        Self::rejected(job.job_id.clone(), job.track_id.clone(), error)
    }

    /// Failure report for a job known only by its identifiers, e.g. a batch
    /// record that did not decode.
    pub fn rejected(job_id: JobId, track_id: impl Into<String>, error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown transcoding error".to_string();
        }
        Self {
            job_id,
            track_id: track_id.into(),
            success: false,
            streaming_audio_key: None,
            hifi_audio_key: None,
            archive_audio_key: None,
            original_audio_key: None,
            error: Some(error),
        }
    }
}
