//! Lossless source formats.

use std::fmt;

/// Format of the uploaded lossless source, derived from its extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Wav,
    Flac,
    Aiff,
    /// Anything else; the encoder probes the input itself.
    Other(String),
}

impl SourceFormat {
    /// Parse a file extension (case-insensitive, leading dot allowed).
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "wav" | "wave" => SourceFormat::Wav,
            "flac" => SourceFormat::Flac,
            "aiff" | "aif" => SourceFormat::Aiff,
            _ => SourceFormat::Other(ext),
        }
    }

    /// File extension used for the downloaded source.
    pub fn extension(&self) -> &str {
        match self {
            SourceFormat::Wav => "wav",
            SourceFormat::Flac => "flac",
            SourceFormat::Aiff => "aiff",
            SourceFormat::Other(ext) if ext.is_empty() => "bin",
            SourceFormat::Other(ext) => ext,
        }
    }

    /// Input demuxer name to force on the encoder, if known.
    pub fn demuxer(&self) -> Option<&'static str> {
        match self {
            SourceFormat::Wav => Some("wav"),
            SourceFormat::Flac => Some("flac"),
            SourceFormat::Aiff => Some("aiff"),
            SourceFormat::Other(_) => None,
        }
    }

    /// Content type for the archived original.
    pub fn content_type(&self) -> &'static str {
        match self {
            SourceFormat::Wav => "audio/wav",
            SourceFormat::Flac => "audio/flac",
            SourceFormat::Aiff => "audio/aiff",
            SourceFormat::Other(_) => "application/octet-stream",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
