//! Job definitions for queue processing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::SourceFormat;

/// Opaque job identifier issued by the control API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One track's pending transcoding work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodingJob {
    /// Unique job ID
    pub job_id: JobId,

    /// Catalog track
    pub track_id: String,

    /// Catalog band (used in storage key paths)
    pub band_id: String,

    /// Catalog album (used in storage key paths)
    pub album_id: String,

    /// Storage key of the uploaded lossless source
    pub original_audio_key: String,

    /// Lowercase extension of the source file; empty when the control API
    /// sent none, in which case the encoder probes the input
    #[serde(default, deserialize_with = "lowercase")]
    pub original_format: String,

    /// Times this job has been dequeued, tracked by the control API
    #[serde(default)]
    pub attempts: u32,
}

impl TranscodingJob {
    /// Source format parsed from `original_format`.
    pub fn source_format(&self) -> SourceFormat {
        SourceFormat::from_extension(&self.original_format)
    }
}

fn lowercase<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(s.trim().trim_start_matches('.').to_ascii_lowercase())
}

/// Response body of the fetch-batch call.
///
/// Records stay raw until [`JobBatch::into_entries`], so one bad record
/// cannot take the rest of the batch down with it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobBatch {
    #[serde(default)]
    pub jobs: Vec<Value>,
}

impl JobBatch {
    /// Decode each record independently, preserving order.
    pub fn into_entries(self) -> Vec<BatchEntry> {
        self.jobs.into_iter().map(BatchEntry::decode).collect()
    }
}

/// One record of a fetched batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEntry {
    Job(TranscodingJob),
    Malformed(MalformedJob),
}

/// A batch record that does not decode as a [`TranscodingJob`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedJob {
    /// Recovered when the record carries a usable `jobId`
    pub job_id: Option<JobId>,
    pub track_id: Option<String>,
    /// Decode error
    pub reason: String,
}

impl BatchEntry {
    pub fn decode(value: Value) -> Self {
        match TranscodingJob::deserialize(&value) {
            Ok(job) => BatchEntry::Job(job),
            Err(e) => BatchEntry::Malformed(MalformedJob {
                job_id: id_field(&value, "jobId").map(JobId),
                track_id: id_field(&value, "trackId"),
                reason: e.to_string(),
            }),
        }
    }
}

/// Identifier fields as strings; numeric ids are accepted.
fn id_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_deserializes_camel_case() {
        let json = r#"{
            "jobId": "job-1",
            "trackId": "track-1",
            "bandId": "band-1",
            "albumId": "album-1",
            "originalAudioKey": "originals/track-1.wav",
            "originalFormat": "WAV",
            "attempts": 2
        }"#;

        let job: TranscodingJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.job_id.as_str(), "job-1");
        assert_eq!(job.original_format, "wav");
        assert_eq!(job.attempts, 2);
        assert_eq!(job.source_format(), SourceFormat::Wav);
    }

    #[test]
    fn test_attempts_defaults_to_zero() {
        let json = r#"{
            "jobId": "job-2",
            "trackId": "t",
            "bandId": "b",
            "albumId": "a",
            "originalAudioKey": "k",
            "originalFormat": ".aif"
        }"#;

        let job: TranscodingJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.attempts, 0);
        assert_eq!(job.source_format(), SourceFormat::Aiff);
    }

    #[test]
    fn test_missing_or_null_format_falls_back_to_probe() {
        let mut json = serde_json::json!({
            "jobId": "job-3",
            "trackId": "t",
            "bandId": "b",
            "albumId": "a",
            "originalAudioKey": "k",
            "originalFormat": null
        });
        let job: TranscodingJob = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(job.original_format, "");
        assert_eq!(job.source_format(), SourceFormat::Other(String::new()));

        json.as_object_mut().unwrap().remove("originalFormat");
        let job: TranscodingJob = serde_json::from_value(json).unwrap();
        assert_eq!(job.source_format().demuxer(), None);
    }

    #[test]
    fn test_batch_decodes_records_independently() {
        let batch: JobBatch = serde_json::from_value(serde_json::json!({
            "jobs": [
                {
                    "jobId": "good",
                    "trackId": "t1",
                    "bandId": "b",
                    "albumId": "a",
                    "originalAudioKey": "k",
                    "originalFormat": "flac"
                },
                { "jobId": 17, "trackId": "t2" },
                "not a job"
            ]
        }))
        .unwrap();

        let entries = batch.into_entries();
        assert_eq!(entries.len(), 3);
        assert!(matches!(&entries[0], BatchEntry::Job(job) if job.job_id.as_str() == "good"));

        match &entries[1] {
            BatchEntry::Malformed(bad) => {
                assert_eq!(bad.job_id, Some(JobId::from_string("17")));
                assert_eq!(bad.track_id.as_deref(), Some("t2"));
                assert!(bad.reason.contains("bandId"), "{}", bad.reason);
            }
            other => panic!("expected malformed record, got {:?}", other),
        }

        match &entries[2] {
            BatchEntry::Malformed(bad) => {
                assert_eq!(bad.job_id, None);
                assert_eq!(bad.track_id, None);
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_batch() {
        let batch: JobBatch = serde_json::from_str(r#"{"jobs": []}"#).unwrap();
        assert!(batch.into_entries().is_empty());

        let batch: JobBatch = serde_json::from_str("{}").unwrap();
        assert!(batch.into_entries().is_empty());
    }
}
