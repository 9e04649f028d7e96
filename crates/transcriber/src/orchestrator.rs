//! Sequential execution of a task catalog with per-task failure isolation.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use stemscribe_domain::{StemSet, TaskOutcome, TranscriptionTask};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::aggregate::inspect_artifacts;
use crate::capability::Transcriber;
use crate::error::RunError;

pub struct TaskOrchestrator {
    transcriber: Arc<dyn Transcriber>,
    task_timeout: Option<Duration>,
}

impl TaskOrchestrator {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            transcriber,
            task_timeout: None,
        }
    }

    pub fn with_timeout(mut self, task_timeout: Option<Duration>) -> Self {
        self.task_timeout = task_timeout;
        self
    }

    /// Runs every task in catalog order, one outcome per task.
    ///
    /// Only an unusable capability layer or output directory ends the run
    /// early; everything a single task does is recorded as its outcome.
    #[instrument(skip_all, fields(transcriber = self.transcriber.name(), tasks = tasks.len()))]
    pub async fn run(
        &self,
        stems: &StemSet,
        tasks: &[TranscriptionTask],
        output_dir: &Path,
    ) -> Result<Vec<TaskOutcome>, RunError> {
        self.transcriber
            .initialize()
            .await
            .map_err(RunError::CapabilityUnavailable)?;
        std::fs::create_dir_all(output_dir).map_err(|source| RunError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            info!(
                task = task.name,
                position = index + 1,
                total = tasks.len(),
                "starting task"
            );
            let outcome = self.run_task(stems, task, output_dir).await;
            log_outcome(task, &outcome);
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    async fn run_task(
        &self,
        stems: &StemSet,
        task: &TranscriptionTask,
        output_dir: &Path,
    ) -> TaskOutcome {
        let Some(input) = stems.get(task.required_role) else {
            return TaskOutcome::skipped();
        };
        if let Err(err) = clear_previous_artifacts(task, output_dir) {
            return TaskOutcome::hard_failure(format!("could not clear previous output: {err}"));
        }
        let output = task.output_path(output_dir);
        match self.invoke(task, input.to_path_buf(), output).await {
            Ok(()) => inspect_artifacts(task, output_dir),
            Err(detail) => TaskOutcome::hard_failure(detail),
        }
    }

    /// Calls the capability on its own task so a panic or a hang cannot
    /// take the batch down with it.
    async fn invoke(
        &self,
        task: &TranscriptionTask,
        input: PathBuf,
        output: PathBuf,
    ) -> Result<(), String> {
        let transcriber = Arc::clone(&self.transcriber);
        let capability = task.capability;
        let mut handle = tokio::spawn(async move {
            transcriber.transcribe(capability, &input, &output).await
        });

        let joined = match self.task_timeout {
            Some(limit) => match timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    handle.abort();
                    return Err(format!("timed out after {}s", limit.as_secs_f64()));
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.to_string()),
            Err(join_err) if join_err.is_panic() => {
                Err(format!("{capability} capability panicked"))
            }
            Err(join_err) => Err(join_err.to_string()),
        }
    }
}

/// Removes whatever an earlier run left under this task's names, so only a
/// file written by this invocation can count as its artifact.
fn clear_previous_artifacts(task: &TranscriptionTask, output_dir: &Path) -> io::Result<()> {
    let names = [task.output_name, task.expected_artifact]
        .into_iter()
        .chain(task.secondary_artifacts.iter().copied());
    for name in names {
        match std::fs::remove_file(output_dir.join(name)) {
            Ok(()) => debug!(task = task.name, file = name, "removed previous artifact"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn log_outcome(task: &TranscriptionTask, outcome: &TaskOutcome) {
    match outcome {
        TaskOutcome::Success { artifact, .. } => info!(
            task = task.name,
            artifact = %artifact.path.display(),
            size_bytes = artifact.size_bytes,
            "task succeeded"
        ),
        TaskOutcome::SoftFailure { reason } => {
            warn!(task = task.name, %reason, "task produced no usable output")
        }
        TaskOutcome::HardFailure { error } => error!(task = task.name, %error, "task failed"),
        TaskOutcome::Skipped { reason } => warn!(task = task.name, %reason, "task skipped"),
        TaskOutcome::Missing { reason } => warn!(task = task.name, %reason, "artifact missing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use stemscribe_domain::outcome::NO_ARTIFACT;
    use stemscribe_domain::{Capability, Role};

    use crate::aggregate::ResultAggregator;
    use crate::catalog::{MIX_CATALOG, STEM_CATALOG};
    use crate::error::CapabilityError;

    #[derive(Clone, Copy)]
    enum Behavior {
        /// Write `bytes` to the output path with `suffix` appended.
        Write {
            suffix: &'static str,
            bytes: &'static [u8],
        },
        Silent,
        Fail,
        Panic,
        Hang,
    }

    struct MockTranscriber {
        available: bool,
        behaviors: HashMap<Capability, Behavior>,
        calls: Mutex<Vec<(Capability, PathBuf)>>,
    }

    impl MockTranscriber {
        fn new(behaviors: &[(Capability, Behavior)]) -> Self {
            Self {
                available: true,
                behaviors: behaviors.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn unavailable() -> Self {
            Self {
                available: false,
                ..Self::new(&[])
            }
        }

        fn calls(&self) -> Vec<(Capability, PathBuf)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transcriber for MockTranscriber {
        fn name(&self) -> &str {
            "mock"
        }

        async fn initialize(&self) -> Result<(), CapabilityError> {
            if self.available {
                Ok(())
            } else {
                Err(CapabilityError::Initialization {
                    reason: "module not installed".to_string(),
                })
            }
        }

        async fn transcribe(
            &self,
            capability: Capability,
            input: &Path,
            output: &Path,
        ) -> Result<(), CapabilityError> {
            self.calls
                .lock()
                .unwrap()
                .push((capability, input.to_path_buf()));
            match self.behaviors.get(&capability).copied().unwrap_or(Behavior::Silent) {
                Behavior::Write { suffix, bytes } => {
                    let target = format!("{}{}", output.display(), suffix);
                    std::fs::write(target, bytes)?;
                    Ok(())
                }
                Behavior::Silent => Ok(()),
                Behavior::Fail => Err(CapabilityError::Failed {
                    capability,
                    status: "exit status: 1".to_string(),
                    stderr: "checkpoint not found".to_string(),
                }),
                Behavior::Panic => panic!("inference blew up"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
            }
        }
    }

    const MIDI: Behavior = Behavior::Write {
        suffix: "",
        bytes: b"MThd\0\0\0\x06",
    };

    fn orchestrator(mock: &Arc<MockTranscriber>) -> TaskOrchestrator {
        let transcriber: Arc<dyn Transcriber> = mock.clone();
        TaskOrchestrator::new(transcriber)
    }

    #[tokio::test]
    async fn mixture_run_with_one_raising_capability() {
        let out = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockTranscriber::new(&[
            (Capability::Music, MIDI),
            (
                Capability::VocalContour,
                Behavior::Write {
                    suffix: "_f0.csv",
                    bytes: b"time,f0\n0.0,220.0\n",
                },
            ),
            (Capability::Chord, Behavior::Fail),
        ]));
        let stems = StemSet::single_mix("/audio/mixture_128.mp3", [Role::FullMix]);

        let outcomes = orchestrator(&mock)
            .run(&stems, MIX_CATALOG, out.path())
            .await
            .unwrap();
        let report = ResultAggregator
            .aggregate(out.path(), MIX_CATALOG, outcomes)
            .unwrap();

        let counts = report.counts();
        assert_eq!(counts.succeeded, 2);
        assert_eq!(counts.hard_failed, 1);
        assert_ne!(report.exit_code(), 0);
        assert!(matches!(
            report.entries()[2].outcome,
            TaskOutcome::HardFailure { .. }
        ));
        assert!(mock
            .calls()
            .iter()
            .all(|(_, input)| input == Path::new("/audio/mixture_128.mp3")));
    }

    #[tokio::test]
    async fn stem_run_skips_unresolved_roles_and_flags_silent_capabilities() {
        let out = tempfile::tempdir().unwrap();
        let mut paths = std::collections::BTreeMap::new();
        paths.insert(Role::Vocals, PathBuf::from("/stems/vocals.wav"));
        paths.insert(Role::Other, PathBuf::from("/stems/other.wav"));
        let stems = StemSet::new(paths, Vec::new());
        let mock = Arc::new(MockTranscriber::new(&[
            (Capability::Music, MIDI),
            (Capability::VocalContour, Behavior::Silent),
            (
                Capability::Chord,
                Behavior::Write {
                    suffix: "",
                    bytes: b"",
                },
            ),
        ]));

        let outcomes = orchestrator(&mock)
            .run(&stems, STEM_CATALOG, out.path())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), STEM_CATALOG.len());
        assert!(outcomes[0].is_success());
        assert!(matches!(outcomes[1], TaskOutcome::SoftFailure { .. }));
        assert!(matches!(outcomes[2], TaskOutcome::SoftFailure { .. }));
        assert_eq!(outcomes[3], TaskOutcome::skipped());
        // the bass task never reached the capability
        assert_eq!(mock.calls().len(), 3);
    }

    #[tokio::test]
    async fn success_size_matches_written_bytes() {
        let out = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockTranscriber::new(&[(Capability::Music, MIDI)]));
        let stems = StemSet::single_mix("/audio/mix.wav", [Role::FullMix]);
        let outcomes = orchestrator(&mock)
            .run(&stems, &MIX_CATALOG[..1], out.path())
            .await
            .unwrap();
        let written = std::fs::metadata(out.path().join("music_notes.mid"))
            .unwrap()
            .len();
        match &outcomes[0] {
            TaskOutcome::Success { artifact, .. } => assert_eq!(artifact.size_bytes, written),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_artifact_does_not_count_for_a_silent_capability() {
        let out = tempfile::tempdir().unwrap();
        std::fs::write(out.path().join("music_notes.mid"), b"MThd\0\0\0\x06").unwrap();
        let mock = Arc::new(MockTranscriber::new(&[(Capability::Music, Behavior::Silent)]));
        let stems = StemSet::single_mix("/audio/mix.wav", [Role::FullMix]);

        let outcomes = orchestrator(&mock)
            .run(&stems, &MIX_CATALOG[..1], out.path())
            .await
            .unwrap();

        assert_eq!(outcomes[0], TaskOutcome::soft_failure(NO_ARTIFACT));
        assert!(!out.path().join("music_notes.mid").exists());
    }

    #[tokio::test]
    async fn stale_secondary_artifacts_are_cleared_before_the_call() {
        let out = tempfile::tempdir().unwrap();
        let chords = MIX_CATALOG[2];
        for name in [chords.expected_artifact]
            .into_iter()
            .chain(chords.secondary_artifacts.iter().copied())
        {
            std::fs::write(out.path().join(name), b"old").unwrap();
        }
        let mock = Arc::new(MockTranscriber::new(&[(Capability::Chord, MIDI)]));
        let stems = StemSet::single_mix("/audio/mix.wav", [Role::FullMix]);

        let outcomes = orchestrator(&mock)
            .run(&stems, &[chords], out.path())
            .await
            .unwrap();

        match &outcomes[0] {
            TaskOutcome::Success { artifact, secondary } => {
                assert_eq!(artifact.size_bytes, 8);
                assert!(secondary.is_empty());
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unavailable_capability_produces_no_outcomes() {
        let out = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockTranscriber::unavailable());
        let stems = StemSet::single_mix("/audio/mix.wav", [Role::FullMix]);
        let result = orchestrator(&mock)
            .run(&stems, MIX_CATALOG, out.path())
            .await;
        assert!(matches!(result, Err(RunError::CapabilityUnavailable(_))));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn panicking_capability_is_isolated() {
        let out = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockTranscriber::new(&[
            (Capability::Music, Behavior::Panic),
            (Capability::Chord, MIDI),
        ]));
        let stems = StemSet::single_mix("/audio/mix.wav", [Role::FullMix]);
        let outcomes = orchestrator(&mock)
            .run(&stems, MIX_CATALOG, out.path())
            .await
            .unwrap();
        assert!(matches!(outcomes[0], TaskOutcome::HardFailure { .. }));
        assert!(outcomes[2].is_success());
    }

    #[tokio::test]
    async fn hung_capability_times_out() {
        let out = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockTranscriber::new(&[
            (Capability::Music, Behavior::Hang),
            (Capability::Chord, MIDI),
        ]));
        let stems = StemSet::single_mix("/audio/mix.wav", [Role::FullMix]);
        let outcomes = orchestrator(&mock)
            .with_timeout(Some(Duration::from_millis(50)))
            .run(&stems, MIX_CATALOG, out.path())
            .await
            .unwrap();
        match &outcomes[0] {
            TaskOutcome::HardFailure { error } => assert!(error.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(outcomes[2].is_success());
    }

    #[tokio::test]
    async fn in_memory_and_disk_reports_agree_on_counts() {
        let out = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockTranscriber::new(&[
            (Capability::Music, MIDI),
            (Capability::Chord, Behavior::Fail),
        ]));
        let stems = StemSet::single_mix("/audio/mix.wav", [Role::FullMix]);
        let outcomes = orchestrator(&mock)
            .run(&stems, MIX_CATALOG, out.path())
            .await
            .unwrap();

        let live = ResultAggregator
            .aggregate(out.path(), MIX_CATALOG, outcomes)
            .unwrap();
        let replay = ResultAggregator.aggregate_from_disk(MIX_CATALOG, out.path());
        assert_eq!(live.counts().succeeded, replay.counts().succeeded);
        assert_eq!(live.counts().unsuccessful(), replay.counts().unsuccessful());
        assert_eq!(live.entries().len(), replay.entries().len());
        // the failed chords and the silent vocal contour left nothing behind
        assert_eq!(replay.counts().missing, 2);
        assert_eq!(replay.counts().soft_failed, 0);
    }

    #[tokio::test]
    async fn disk_report_does_not_claim_unrun_tasks_ran() {
        let out = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockTranscriber::new(&[]));
        let outcomes = orchestrator(&mock)
            .run(&StemSet::default(), STEM_CATALOG, out.path())
            .await
            .unwrap();
        let live = ResultAggregator
            .aggregate(out.path(), STEM_CATALOG, outcomes)
            .unwrap();
        let replay = ResultAggregator.aggregate_from_disk(STEM_CATALOG, out.path());

        assert_eq!(live.counts().skipped, STEM_CATALOG.len());
        assert_eq!(replay.counts().missing, STEM_CATALOG.len());
        assert_eq!(live.counts().unsuccessful(), replay.counts().unsuccessful());
        let summary = replay.summary();
        assert!(summary.contains("Partially succeeded (ran, no usable output) (0): none"));
        assert!(summary.contains("Failed or skipped (4)"));
    }
}
