use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// External transcription function a task is routed to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Note transcription of pitched instruments.
    Music,
    /// Frame-level vocal melody (F0) extraction.
    VocalContour,
    /// Chord progression recognition.
    Chord,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::Music,
        Capability::VocalContour,
        Capability::Chord,
    ];

    /// Name the external command knows this capability by.
    pub fn command_name(&self) -> &'static str {
        match self {
            Capability::Music => "music",
            Capability::VocalContour => "vocal-contour",
            Capability::Chord => "chord",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.command_name())
    }
}

/// Static description of one unit of transcription work.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct TranscriptionTask {
    pub name: &'static str,
    pub required_role: Role,
    pub capability: Capability,
    /// Filename handed to the capability as its output path.
    pub output_name: &'static str,
    /// Primary file whose presence marks the task as successful.
    pub expected_artifact: &'static str,
    /// Auxiliary files sharing the output base name, listed when present.
    pub secondary_artifacts: &'static [&'static str],
}

impl TranscriptionTask {
    /// Task whose capability writes exactly the path it is given.
    pub const fn simple(
        name: &'static str,
        required_role: Role,
        capability: Capability,
        artifact: &'static str,
    ) -> Self {
        Self {
            name,
            required_role,
            capability,
            output_name: artifact,
            expected_artifact: artifact,
            secondary_artifacts: &[],
        }
    }

    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.output_name)
    }

    pub fn artifact_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.expected_artifact)
    }
}
