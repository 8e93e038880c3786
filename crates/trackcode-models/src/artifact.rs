//! Artifact kinds produced per job.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three files uploaded for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// AAC streaming output (standard tier)
    Streaming,
    /// FLAC streaming output (hi-fi tier)
    Hifi,
    /// Unmodified copy of the lossless source
    Archive,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Streaming => "streaming",
            ArtifactKind::Hifi => "hifi",
            ArtifactKind::Archive => "archive",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
