pub mod aggregate;
pub mod capability;
pub mod catalog;
pub mod checkpoints;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;

pub use aggregate::ResultAggregator;
pub use capability::{CommandTranscriber, Transcriber};
pub use catalog::CatalogKind;
pub use config::{load_config, Config};
pub use error::{CapabilityError, ConfigError, RunError};
pub use orchestrator::TaskOrchestrator;
pub use pipeline::{TranscriptionJob, TranscriptionPipeline};
