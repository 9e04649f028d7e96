//! Boundary to the external transcription engines.
//!
//! A capability is opaque: it is handed an input and an output path and
//! either fails or returns having (maybe) written the output. Whether it
//! actually produced anything is decided by the caller looking on disk.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use stemscribe_domain::Capability;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::CapabilityError;

const STDERR_TAIL_LINES: usize = 12;

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Returns the name of this transcriber implementation.
    fn name(&self) -> &str;

    /// Checks the capability layer can be used at all. Called once per run.
    async fn initialize(&self) -> Result<(), CapabilityError>;

    async fn transcribe(
        &self,
        capability: Capability,
        input: &Path,
        output: &Path,
    ) -> Result<(), CapabilityError>;
}

/// Runs each capability as `<program> <args..> <capability> transcribe <input> --output <output>`.
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    program: PathBuf,
    args: Vec<String>,
    checkpoint_env: String,
    checkpoint_dir: PathBuf,
}

impl CommandTranscriber {
    pub fn new(program: impl Into<PathBuf>, checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            checkpoint_env: crate::config::CapabilityConfig::default().checkpoint_env,
            checkpoint_dir: checkpoint_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.capability.program.clone(),
            args: config.capability.args.clone(),
            checkpoint_env: config.capability.checkpoint_env.clone(),
            checkpoint_dir: config.checkpoint_dir.clone(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Finds the program either at its explicit path or on `PATH`.
    pub fn locate(&self) -> Option<PathBuf> {
        if self.program.components().count() > 1 {
            return self.program.is_file().then(|| self.program.clone());
        }
        let path_var = env::var_os("PATH")?;
        env::split_paths(&path_var)
            .map(|dir| dir.join(&self.program))
            .find(|candidate| candidate.is_file())
    }
}

#[async_trait]
impl Transcriber for CommandTranscriber {
    fn name(&self) -> &str {
        "command"
    }

    async fn initialize(&self) -> Result<(), CapabilityError> {
        let located = self
            .locate()
            .ok_or_else(|| CapabilityError::ProgramNotFound {
                program: self.program.clone(),
            })?;
        info!(program = %located.display(), "transcription program located");
        Ok(())
    }

    async fn transcribe(
        &self,
        capability: Capability,
        input: &Path,
        output: &Path,
    ) -> Result<(), CapabilityError> {
        debug!(%capability, input = %input.display(), output = %output.display(), "spawning transcription");
        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(capability.command_name())
            .arg("transcribe")
            .arg(input)
            .arg("--output")
            .arg(output)
            .env(&self.checkpoint_env, &self.checkpoint_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !result.status.success() {
            return Err(CapabilityError::Failed {
                capability,
                status: result.status.to_string(),
                stderr: tail(&result.stderr),
            });
        }
        debug!(%capability, stdout = %tail(&result.stdout), "transcription finished");
        Ok(())
    }
}

fn tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
