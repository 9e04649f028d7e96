use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use stemscribe_audio::StemResolver;
use stemscribe_domain::{AnalysisReport, StemSet, TranscriptionTask};

use crate::aggregate::ResultAggregator;
use crate::capability::{CommandTranscriber, Transcriber};
use crate::catalog::required_roles;
use crate::config::Config;
use crate::error::RunError;
use crate::orchestrator::TaskOrchestrator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionJob {
    /// A mixed recording or a directory of stems.
    pub source: PathBuf,
    pub output_dir: PathBuf,
}

/// Resolve stems, run the catalog, report.
pub struct TranscriptionPipeline {
    resolver: StemResolver,
    orchestrator: TaskOrchestrator,
    aggregator: ResultAggregator,
}

impl TranscriptionPipeline {
    pub fn new(resolver: StemResolver, orchestrator: TaskOrchestrator) -> Self {
        Self {
            resolver,
            orchestrator,
            aggregator: ResultAggregator,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let transcriber: Arc<dyn Transcriber> = Arc::new(CommandTranscriber::from_config(config));
        Self::new(
            StemResolver::new(config.stems.clone()),
            TaskOrchestrator::new(transcriber).with_timeout(config.capability.task_timeout()),
        )
    }

    /// Resolves the job's stems, never picking files from its own output
    /// directory.
    pub fn resolve(&self, job: &TranscriptionJob, tasks: &[TranscriptionTask]) -> StemSet {
        self.resolver
            .clone()
            .excluding(&job.output_dir)
            .resolve(&job.source, &required_roles(tasks))
    }

    #[instrument(skip(self, tasks), fields(tasks = tasks.len()))]
    pub async fn transcribe(
        &self,
        job: &TranscriptionJob,
        tasks: &[TranscriptionTask],
    ) -> Result<AnalysisReport, RunError> {
        let stems = self.resolve(job, tasks);
        self.transcribe_stems(job, &stems, tasks).await
    }

    /// Runs the catalog against stems resolved by the caller.
    pub async fn transcribe_stems(
        &self,
        job: &TranscriptionJob,
        stems: &StemSet,
        tasks: &[TranscriptionTask],
    ) -> Result<AnalysisReport, RunError> {
        info!(
            resolved = stems.len(),
            gaps = stems.gaps().len(),
            "stems resolved"
        );
        let outcomes = self.orchestrator.run(stems, tasks, &job.output_dir).await?;
        Ok(self.aggregator.aggregate(&job.output_dir, tasks, outcomes)?)
    }

    /// Report on a previous run's output directory without running anything.
    pub fn inspect(&self, output_dir: &Path, tasks: &[TranscriptionTask]) -> AnalysisReport {
        self.aggregator.aggregate_from_disk(tasks, output_dir)
    }
}
