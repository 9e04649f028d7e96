use std::fs;
use std::path::Path;

use stemscribe_domain::outcome::{EMPTY_ARTIFACT, NO_ARTIFACT};
use stemscribe_domain::{
    AnalysisReport, Artifact, DomainError, ReportEntry, TaskOutcome, TranscriptionTask,
};
use tracing::info;

/// Folds task outcomes into an [`AnalysisReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultAggregator;

impl ResultAggregator {
    /// Pairs in-memory outcomes with the catalog they were produced from.
    pub fn aggregate(
        &self,
        output_dir: &Path,
        tasks: &[TranscriptionTask],
        outcomes: Vec<TaskOutcome>,
    ) -> Result<AnalysisReport, DomainError> {
        if tasks.len() != outcomes.len() {
            return Err(DomainError::OutcomeMismatch {
                tasks: tasks.len(),
                outcomes: outcomes.len(),
            });
        }
        let entries = tasks
            .iter()
            .zip(outcomes)
            .map(|(task, outcome)| ReportEntry {
                task: *task,
                outcome,
            })
            .collect();
        let report = AnalysisReport::new(output_dir, entries);
        info!(counts = ?report.counts(), "aggregated run outcomes");
        Ok(report)
    }

    /// Rebuilds a report purely from what a previous run left on disk.
    ///
    /// Absent artifacts read as [`TaskOutcome::Missing`]: whether the task
    /// failed, was skipped or never ran cannot be told after the fact.
    pub fn aggregate_from_disk(
        &self,
        tasks: &[TranscriptionTask],
        output_dir: &Path,
    ) -> AnalysisReport {
        let entries = tasks
            .iter()
            .map(|task| ReportEntry {
                task: *task,
                outcome: recorded_artifact(task, output_dir).unwrap_or_else(TaskOutcome::missing),
            })
            .collect();
        let report = AnalysisReport::new(output_dir, entries);
        info!(counts = ?report.counts(), "aggregated artifacts on disk");
        report
    }
}

/// Judges a task that just ran by its primary artifact: present and
/// non-empty is success, anything else is a soft failure.
pub fn inspect_artifacts(task: &TranscriptionTask, output_dir: &Path) -> TaskOutcome {
    recorded_artifact(task, output_dir).unwrap_or_else(|| TaskOutcome::soft_failure(NO_ARTIFACT))
}

/// Outcome implied by the primary artifact, or `None` when there is no file.
fn recorded_artifact(task: &TranscriptionTask, output_dir: &Path) -> Option<TaskOutcome> {
    let path = task.artifact_path(output_dir);
    let meta = fs::metadata(&path).ok().filter(|meta| meta.is_file())?;
    if meta.len() == 0 {
        return Some(TaskOutcome::soft_failure(EMPTY_ARTIFACT));
    }
    Some(TaskOutcome::Success {
        artifact: Artifact {
            path,
            size_bytes: meta.len(),
        },
        secondary: task
            .secondary_artifacts
            .iter()
            .filter_map(|name| sized(&output_dir.join(name)))
            .collect(),
    })
}

fn sized(path: &Path) -> Option<Artifact> {
    let meta = fs::metadata(path).ok()?;
    meta.is_file().then(|| Artifact {
        path: path.to_path_buf(),
        size_bytes: meta.len(),
    })
}
