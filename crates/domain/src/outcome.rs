use std::path::PathBuf;

use serde::Serialize;

pub const NO_ARTIFACT: &str = "no artifact produced";
pub const EMPTY_ARTIFACT: &str = "artifact is empty";
pub const ROLE_UNRESOLVED: &str = "role unresolved";
pub const NOT_ON_DISK: &str = "no artifact found on disk";

/// A file written by a capability, sized when it was observed.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// What happened to one task. Recorded once and never changed.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Success {
        artifact: Artifact,
        secondary: Vec<Artifact>,
    },
    /// The capability returned normally but left no usable artifact.
    SoftFailure { reason: String },
    /// The capability raised, timed out or panicked.
    HardFailure { error: String },
    Skipped { reason: String },
    /// Read back from an output directory with no artifact for the task;
    /// whether the task ran at all is unknown.
    Missing { reason: String },
}

impl TaskOutcome {
    pub fn skipped() -> Self {
        TaskOutcome::Skipped {
            reason: ROLE_UNRESOLVED.to_string(),
        }
    }

    pub fn hard_failure(error: impl Into<String>) -> Self {
        TaskOutcome::HardFailure {
            error: error.into(),
        }
    }

    pub fn soft_failure(reason: impl Into<String>) -> Self {
        TaskOutcome::SoftFailure {
            reason: reason.into(),
        }
    }

    pub fn missing() -> Self {
        TaskOutcome::Missing {
            reason: NOT_ON_DISK.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskOutcome::Success { .. } => "success",
            TaskOutcome::SoftFailure { .. } => "soft failure",
            TaskOutcome::HardFailure { .. } => "hard failure",
            TaskOutcome::Skipped { .. } => "skipped",
            TaskOutcome::Missing { .. } => "missing",
        }
    }
}
