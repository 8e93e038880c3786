//! Object storage transfers over presigned URLs.
//!
//! This crate provides:
//! - Streaming download of the lossless source to disk
//! - Streaming PUT upload of artifacts with their content type
//! - URL redaction for logs

pub mod error;
pub mod transfer;

pub use error::{StorageError, StorageResult};
pub use transfer::{redact, PresignedTransfer, TransferConfig};
