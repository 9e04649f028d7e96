use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use stemscribe_audio::StemPatterns;

use crate::error::ConfigError;

pub const ENV_PREFIX: &str = "STEMSCRIBE_";

/// Run-wide settings, established once at startup and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Root the capability loads model checkpoints from.
    pub checkpoint_dir: PathBuf,
    pub output_dir: PathBuf,
    pub capability: CapabilityConfig,
    pub stems: StemPatterns,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
            output_dir: PathBuf::from("analysis_results"),
            capability: CapabilityConfig::default(),
            stems: StemPatterns::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CapabilityConfig {
    /// External transcription command.
    pub program: PathBuf,
    /// Arguments placed before the capability name.
    pub args: Vec<String>,
    /// Variable the checkpoint directory is exported through.
    pub checkpoint_env: String,
    pub task_timeout_secs: Option<u64>,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("omnizart"),
            args: Vec::new(),
            checkpoint_env: "STEMSCRIBE_CHECKPOINT_DIR".to_string(),
            task_timeout_secs: None,
        }
    }
}

impl CapabilityConfig {
    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_secs.map(Duration::from_secs)
    }
}

fn default_checkpoint_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("stemscribe").join("checkpoints"))
        .unwrap_or_else(|| PathBuf::from(".stemscribe").join("checkpoints"))
}

/// Load configuration from defaults, an optional TOML file and
/// `STEMSCRIBE_` environment variables (nested keys split on `__`).
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from a TOML string over the defaults (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml_str))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
