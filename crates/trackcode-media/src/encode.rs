//! The two fixed streaming encodes.
//!
//! Parameters never depend on the input file: every track is normalised to
//! the same AAC and FLAC profiles.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};
use trackcode_models::SourceFormat;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// AAC bitrate for the standard tier.
pub const AAC_BITRATE: &str = "256k";
/// AAC sample rate in Hz.
pub const AAC_SAMPLE_RATE: u32 = 48_000;
/// FLAC sample rate in Hz (CD quality).
pub const FLAC_SAMPLE_RATE: u32 = 44_100;
/// FLAC sample format (16-bit).
pub const FLAC_SAMPLE_FORMAT: &str = "s16";
/// Highest compression level FFmpeg's FLAC encoder accepts.
pub const FLAC_COMPRESSION_LEVEL: u8 = 12;
/// Both targets are stereo.
pub const OUTPUT_CHANNELS: u8 = 2;

/// Target streaming format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioTarget {
    /// AAC in an MP4 container, moov atom at the front
    Streaming,
    /// 16-bit / 44.1 kHz FLAC
    HiFi,
}

impl AudioTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioTarget::Streaming => "streaming",
            AudioTarget::HiFi => "hifi",
        }
    }

    /// Output file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioTarget::Streaming => "m4a",
            AudioTarget::HiFi => "flac",
        }
    }

    /// Content type sent on upload.
    pub fn content_type(&self) -> &'static str {
        match self {
            AudioTarget::Streaming => "audio/mp4",
            AudioTarget::HiFi => "audio/flac",
        }
    }

    /// Build the encoder invocation for this target.
    pub fn command(
        &self,
        input: &Path,
        source_format: &SourceFormat,
        output: &Path,
    ) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(input, output);
        if let Some(demuxer) = source_format.demuxer() {
            cmd = cmd.input_format(demuxer);
        }
        let cmd = cmd.no_video();

        match self {
            AudioTarget::Streaming => cmd
                .audio_codec("aac")
                .audio_bitrate(AAC_BITRATE)
                .sample_rate(AAC_SAMPLE_RATE)
                .channels(OUTPUT_CHANNELS)
                .output_args(["-movflags", "+faststart"]),
            AudioTarget::HiFi => cmd
                .audio_codec("flac")
                .sample_format(FLAC_SAMPLE_FORMAT)
                .sample_rate(FLAC_SAMPLE_RATE)
                .channels(OUTPUT_CHANNELS)
                .output_arg("-compression_level")
                .output_arg(FLAC_COMPRESSION_LEVEL.to_string()),
        }
    }
}

/// A finished encode on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Seam between the worker and the external encoder.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Encode `input` into `output` for the given target.
    async fn encode(
        &self,
        target: AudioTarget,
        input: &Path,
        source_format: &SourceFormat,
        output: &Path,
    ) -> MediaResult<EncodedFile>;
}

/// Encoder backed by the FFmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    runner: FfmpegRunner,
}

impl FfmpegEncoder {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            runner: FfmpegRunner::new(binary).with_timeout(timeout),
        }
    }

    /// Fail unless the binary can be found and runs.
    pub async fn verify(&self) -> MediaResult<()> {
        crate::command::check_encoder(self.runner.binary())?;
        self.runner.verify().await
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(
        &self,
        target: AudioTarget,
        input: &Path,
        source_format: &SourceFormat,
        output: &Path,
    ) -> MediaResult<EncodedFile> {
        let cmd = target.command(input, source_format, output);
        let started = Instant::now();

        let result = self.runner.run(&cmd).await?;
        if result.mentions_error() {
            warn!(
                audio_target = target.as_str(),
                "Encoder exited cleanly but reported: {}", result.stderr
            );
        }

        let size_bytes = match tokio::fs::metadata(output).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };
        if size_bytes == 0 {
            return Err(MediaError::EmptyOutput(output.to_path_buf()));
        }

        info!(
            audio_target = target.as_str(),
            size_bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Encoded {}",
            output.display()
        );

        Ok(EncodedFile {
            path: output.to_path_buf(),
            size_bytes,
        })
    }
}
