//! Client for the transcoding control API.
//!
//! The control API owns job state, retry counts and presigned URL issuance.
//! The worker only fetches batches, asks for URLs and reports outcomes.

pub mod client;
pub mod error;

pub use client::{ControlApiClient, ControlApiConfig, AUTH_HEADER};
pub use error::{QueueError, QueueResult};
