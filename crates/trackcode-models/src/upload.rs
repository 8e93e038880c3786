//! Presigned URL request and response types.

use serde::{Deserialize, Serialize};

use crate::{ArtifactKind, TranscodingJob};

/// Body of the presign call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub track_id: String,
    pub original_audio_key: String,
    pub band_id: String,
    pub album_id: String,
}

impl PresignRequest {
    pub fn for_job(job: &TranscodingJob) -> Self {
        Self {
            track_id: job.track_id.clone(),
            original_audio_key: job.original_audio_key.clone(),
            band_id: job.band_id.clone(),
            album_id: job.album_id.clone(),
        }
    }
}

/// Upload destination for a single artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    pub upload_url: String,
    pub key: String,
}

/// Fresh set of presigned URLs for one job attempt.
///
/// Never cached: URLs expire and keys may change between attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUploadSet {
    /// Time-limited URL of the original file
    pub download_url: String,
    pub streaming: UploadTarget,
    pub hifi: UploadTarget,
    pub archive: UploadTarget,
}

impl PresignedUploadSet {
    /// Upload target for an artifact kind.
    pub fn target(&self, kind: ArtifactKind) -> &UploadTarget {
        match kind {
            ArtifactKind::Streaming => &self.streaming,
            ArtifactKind::Hifi => &self.hifi,
            ArtifactKind::Archive => &self.archive,
        }
    }
}
