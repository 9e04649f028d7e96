use std::path::PathBuf;

use stemscribe_domain::{Capability, DomainError};
use thiserror::Error;

/// Failures raised by a transcription capability.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("transcription program not found: {}", program.display())]
    ProgramNotFound { program: PathBuf },

    #[error("capability could not be initialized: {reason}")]
    Initialization { reason: String },

    #[error("{capability} transcription exited with {status}: {stderr}")]
    Failed {
        capability: Capability,
        status: String,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Conditions that end a run before a report can be produced.
#[derive(Debug, Error)]
pub enum RunError {
    /// Nothing routed through the capability could succeed, so no task runs.
    #[error("transcription capability unavailable: {0}")]
    CapabilityUnavailable(#[source] CapabilityError),

    #[error("failed to prepare output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),
    #[error("failed to parse configuration: {0}")]
    ParseError(String),
}
