//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Upper bound on stderr kept for error messages.
const STDERR_TAIL_BYTES: usize = 2000;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Force the input demuxer.
    pub fn input_format(self, format: impl Into<String>) -> Self {
        self.input_arg("-f").input_arg(format)
    }

    /// Drop video streams (embedded cover art).
    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Set output sample rate in Hz.
    pub fn sample_rate(self, hz: u32) -> Self {
        self.output_arg("-ar").output_arg(hz.to_string())
    }

    /// Set output channel count.
    pub fn channels(self, count: u8) -> Self {
        self.output_arg("-ac").output_arg(count.to_string())
    }

    /// Set output sample format (e.g. `s16`).
    pub fn sample_format(self, format: impl Into<String>) -> Self {
        self.output_arg("-sample_fmt").output_arg(format)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        // Diagnostics only on stderr
        args.push("-v".to_string());
        args.push("error".to_string());

        // Never wait on a tty
        args.push("-nostdin".to_string());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Captured result of a finished encoder process.
#[derive(Debug, Clone, Default)]
pub struct FfmpegOutput {
    /// Tail of the diagnostic stream
    pub stderr: String,
}

impl FfmpegOutput {
    /// Whether the diagnostic stream mentions an error.
    ///
    /// Only a hint; the exit status decides success.
    pub fn mentions_error(&self) -> bool {
        self.stderr.contains("Error")
    }
}

/// Runner for FFmpeg commands with a kill-on-timeout guard.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    /// Encoder binary
    binary: PathBuf,
    /// Timeout per invocation
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    /// Create a new runner for the given binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run an FFmpeg command.
    ///
    /// The child is killed when the returned future is dropped or the
    /// timeout fires.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<FfmpegOutput> {
        let args = cmd.build_args();
        debug!("Running encoder: {} {}", self.binary.display(), args.join(" "));

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let output = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!("Encoder timed out after {:?}, killing process", timeout);
                    return Err(MediaError::Timeout(timeout));
                }
            },
            None => child.wait_with_output().await?,
        };

        let stderr = stderr_tail(&output.stderr);

        if output.status.success() {
            Ok(FfmpegOutput { stderr })
        } else {
            let message = match output.status.code() {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            };
            Err(MediaError::encoder_failed(
                message,
                Some(stderr),
                output.status.code(),
            ))
        }
    }

    /// Verify the binary is invocable (`-version` exits 0).
    pub async fn verify(&self) -> MediaResult<()> {
        let output = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MediaError::encoder_failed(
                "version check failed",
                Some(stderr_tail(&output.stderr)),
                output.status.code(),
            ))
        }
    }

    fn spawn_error(&self, e: std::io::Error) -> MediaError {
        if e.kind() == std::io::ErrorKind::NotFound {
            MediaError::EncoderNotFound(self.binary.display().to_string())
        } else {
            MediaError::Io(e)
        }
    }
}

/// Keep the last `STDERR_TAIL_BYTES` of the diagnostic stream.
fn stderr_tail(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.len() <= STDERR_TAIL_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

/// Locate the encoder binary on disk or in `PATH`.
pub fn check_encoder(binary: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let binary = binary.as_ref();
    which::which(binary).map_err(|_| MediaError::EncoderNotFound(binary.display().to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("in.wav", "out.m4a")
            .input_format("wav")
            .no_video()
            .audio_codec("aac")
            .audio_bitrate("256k");

        let args = cmd.build_args();
        assert_eq!(&args[..5], &["-y", "-v", "error", "-nostdin", "-f"]);

        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[input_pos - 1], "wav");
        assert_eq!(args[input_pos + 1], "in.wav");
        assert_eq!(args.last().unwrap(), "out.m4a");
        assert!(args.contains(&"-vn".to_string()));
    }

    #[test]
    fn test_stderr_tail_truncates_from_front() {
        let long = "x".repeat(STDERR_TAIL_BYTES + 50) + "Error: boom";
        let tail = stderr_tail(long.as_bytes());
        assert!(tail.starts_with("..."));
        assert!(tail.ends_with("Error: boom"));
        assert!(tail.len() <= STDERR_TAIL_BYTES + 3);

        assert_eq!(stderr_tail(b"  short\n"), "short");
    }

    #[test]
    fn test_mentions_error_is_only_a_hint() {
        let output = FfmpegOutput {
            stderr: "Error while decoding stream #0:1".to_string(),
        };
        assert!(output.mentions_error());
        assert!(!FfmpegOutput::default().mentions_error());
    }

    #[tokio::test]
    async fn test_missing_binary_reports_not_found() {
        let runner = FfmpegRunner::new("trackcode-no-such-encoder");
        let err = runner.verify().await.unwrap_err();
        assert!(matches!(err, MediaError::EncoderNotFound(_)));

        assert!(check_encoder("trackcode-no-such-encoder").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        // `false` ignores its arguments and exits 1
        let runner = FfmpegRunner::new("false");
        let cmd = FfmpegCommand::new("in.wav", "out.flac");

        let err = runner.run(&cmd).await.unwrap_err();
        assert!(matches!(err, MediaError::EncoderFailed { .. }));
        assert_eq!(err.exit_code(), Some(1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let runner = FfmpegRunner::new("true").with_timeout(Duration::from_secs(10));
        let cmd = FfmpegCommand::new("in.wav", "out.flac");

        runner.run(&cmd).await.unwrap();
        runner.verify().await.unwrap();
    }

    /// Write an executable shell script standing in for the encoder.
    #[cfg(unix)]
    pub(crate) fn fake_encoder(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_encoder() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = fake_encoder(dir.path(), "exec sleep 30");
        let runner = FfmpegRunner::new(&script).with_timeout(Duration::from_millis(300));
        let cmd = FfmpegCommand::new("in.wav", "out.flac");

        let started = std::time::Instant::now();
        let err = runner.run(&cmd).await.unwrap_err();

        assert!(matches!(err, MediaError::Timeout(t) if t == Duration::from_millis(300)));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(err.to_string().contains("300ms"), "{}", err);
    }
}
