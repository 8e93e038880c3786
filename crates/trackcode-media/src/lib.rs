//! FFmpeg CLI wrapper for audio transcoding.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A runner with timeout, kill-on-drop and stderr capture
//! - The fixed AAC (streaming) and FLAC (hi-fi) targets
//! - The `Encoder` trait the worker drives

pub mod command;
pub mod encode;
pub mod error;

pub use command::{check_encoder, FfmpegCommand, FfmpegOutput, FfmpegRunner};
pub use encode::{AudioTarget, EncodedFile, Encoder, FfmpegEncoder};
pub use error::{MediaError, MediaResult};
