use std::path::{Path, PathBuf};

use serde::Serialize;
use stemscribe_domain::Capability;
use tracing::warn;

/// A model weight file a capability loads from the checkpoint root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointInfo {
    pub name: &'static str,
    pub capability: Capability,
    /// Location relative to the checkpoint root.
    pub relative_path: &'static str,
}

pub const CHECKPOINTS: &[CheckpointInfo] = &[
    CheckpointInfo {
        name: "chord_v1",
        capability: Capability::Chord,
        relative_path: "checkpoints/chord/chord_v1/variables/variables.data-00000-of-00001",
    },
    CheckpointInfo {
        name: "music_piano",
        capability: Capability::Music,
        relative_path: "checkpoints/music/music_piano/variables/variables.data-00000-of-00001",
    },
    CheckpointInfo {
        name: "vocal_contour",
        capability: Capability::VocalContour,
        relative_path: "checkpoints/vocal/vocal_contour/variables/variables.data-00000-of-00001",
    },
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckpointStatus {
    pub name: &'static str,
    pub capability: Capability,
    pub path: PathBuf,
    pub size_bytes: Option<u64>,
}

impl CheckpointStatus {
    pub fn is_present(&self) -> bool {
        self.size_bytes.is_some()
    }
}

pub fn checkpoint_status(root: &Path) -> Vec<CheckpointStatus> {
    CHECKPOINTS
        .iter()
        .map(|info| {
            let path = root.join(info.relative_path);
            let size_bytes = std::fs::metadata(&path)
                .ok()
                .filter(|meta| meta.is_file())
                .map(|meta| meta.len());
            CheckpointStatus {
                name: info.name,
                capability: info.capability,
                path,
                size_bytes,
            }
        })
        .collect()
}

/// Logs every checkpoint the given capabilities need but cannot find.
///
/// Missing weights are not fatal here; the capability reports them per task.
pub fn warn_missing(root: &Path, capabilities: &[Capability]) -> Vec<CheckpointStatus> {
    let missing: Vec<CheckpointStatus> = checkpoint_status(root)
        .into_iter()
        .filter(|status| capabilities.contains(&status.capability) && !status.is_present())
        .collect();
    for status in &missing {
        warn!(
            checkpoint = status.name,
            capability = %status.capability,
            path = %status.path.display(),
            "model checkpoint missing"
        );
    }
    missing
}
