//! Shared data models for the transcoding worker.
//!
//! This crate provides Serde-serializable types for:
//! - Transcoding jobs handed out by the control API
//! - Presigned upload/download sets
//! - Completion and failure reports
//! - Artifact kinds and lossless source formats

pub mod artifact;
pub mod format;
pub mod job;
pub mod report;
pub mod upload;

pub use artifact::ArtifactKind;
pub use format::SourceFormat;
pub use job::{BatchEntry, JobBatch, JobId, MalformedJob, TranscodingJob};
pub use report::{ArtifactKeys, CompletionReport};
pub use upload::{PresignRequest, PresignedUploadSet, UploadTarget};
