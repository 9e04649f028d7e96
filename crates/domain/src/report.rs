use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::{outcome::TaskOutcome, task::TranscriptionTask};

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ReportEntry {
    pub task: TranscriptionTask,
    pub outcome: TaskOutcome,
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ReportCounts {
    pub succeeded: usize,
    pub soft_failed: usize,
    pub hard_failed: usize,
    pub skipped: usize,
    pub missing: usize,
}

impl ReportCounts {
    fn tally<'a>(outcomes: impl Iterator<Item = &'a TaskOutcome>) -> Self {
        let mut counts = Self::default();
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Success { .. } => counts.succeeded += 1,
                TaskOutcome::SoftFailure { .. } => counts.soft_failed += 1,
                TaskOutcome::HardFailure { .. } => counts.hard_failed += 1,
                TaskOutcome::Skipped { .. } => counts.skipped += 1,
                TaskOutcome::Missing { .. } => counts.missing += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.soft_failed + self.hard_failed + self.skipped + self.missing
    }

    /// Every task that did not end in success.
    pub fn unsuccessful(&self) -> usize {
        self.total() - self.succeeded
    }
}

/// Final, immutable view of a run: one entry per catalog task, in order.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AnalysisReport {
    output_dir: PathBuf,
    #[serde(with = "time::serde::rfc3339")]
    generated_at: OffsetDateTime,
    entries: Vec<ReportEntry>,
    counts: ReportCounts,
}

impl AnalysisReport {
    pub fn new(output_dir: impl Into<PathBuf>, entries: Vec<ReportEntry>) -> Self {
        let counts = ReportCounts::tally(entries.iter().map(|entry| &entry.outcome));
        Self {
            output_dir: output_dir.into(),
            generated_at: OffsetDateTime::now_utc(),
            entries,
            counts,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn generated_at(&self) -> OffsetDateTime {
        self.generated_at
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn counts(&self) -> ReportCounts {
        self.counts
    }

    /// Process exit status for the run: zero only without hard failures.
    pub fn exit_code(&self) -> u8 {
        if self.counts.hard_failed == 0 {
            0
        } else {
            1
        }
    }

    /// Human-readable summary grouped into succeeded, partial and failed.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Analysis report for {}", self.output_dir.display());
        if let Ok(stamp) = self.generated_at.format(&Rfc3339) {
            let _ = writeln!(out, "Generated at {stamp}");
        }
        let _ = writeln!(out, "{rule}");

        for (index, entry) in self.entries.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {} [{} <- {}]: {}",
                index + 1,
                entry.task.name,
                entry.task.capability,
                entry.task.required_role,
                entry.outcome.label()
            );
            match &entry.outcome {
                TaskOutcome::Success {
                    artifact,
                    secondary,
                } => {
                    let _ = writeln!(
                        out,
                        "   {} ({} bytes)",
                        artifact.path.display(),
                        artifact.size_bytes
                    );
                    for extra in secondary {
                        let _ = writeln!(
                            out,
                            "   + {} ({} bytes)",
                            extra.path.display(),
                            extra.size_bytes
                        );
                    }
                }
                TaskOutcome::SoftFailure { reason }
                | TaskOutcome::Skipped { reason }
                | TaskOutcome::Missing { reason } => {
                    let _ = writeln!(out, "   {reason}");
                }
                TaskOutcome::HardFailure { error } => {
                    let _ = writeln!(out, "   error: {error}");
                }
            }
        }

        let _ = writeln!(out, "{}", "-".repeat(60));
        self.write_bucket(&mut out, "Fully succeeded", |o| o.is_success());
        self.write_bucket(&mut out, "Partially succeeded (ran, no usable output)", |o| {
            matches!(o, TaskOutcome::SoftFailure { .. })
        });
        self.write_bucket(&mut out, "Failed or skipped", |o| {
            matches!(
                o,
                TaskOutcome::HardFailure { .. }
                    | TaskOutcome::Skipped { .. }
                    | TaskOutcome::Missing { .. }
            )
        });
        let _ = writeln!(
            out,
            "{} of {} tasks succeeded",
            self.counts.succeeded,
            self.counts.total()
        );
        out
    }

    fn write_bucket(&self, out: &mut String, title: &str, filter: impl Fn(&TaskOutcome) -> bool) {
        let names: Vec<&str> = self
            .entries
            .iter()
            .filter(|entry| filter(&entry.outcome))
            .map(|entry| entry.task.name)
            .collect();
        let _ = write!(out, "{title} ({}):", names.len());
        if names.is_empty() {
            let _ = writeln!(out, " none");
        } else {
            let _ = writeln!(out, " {}", names.join(", "));
        }
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{Artifact, NO_ARTIFACT};
    use crate::{Capability, Role};

    const NOTES: TranscriptionTask =
        TranscriptionTask::simple("Musical notes", Role::FullMix, Capability::Music, "notes.mid");
    const CHORDS: TranscriptionTask =
        TranscriptionTask::simple("Chords", Role::FullMix, Capability::Chord, "chords.mid");
    const BASS: TranscriptionTask =
        TranscriptionTask::simple("Bass line", Role::Bass, Capability::Music, "bass.mid");

    fn success(name: &str) -> TaskOutcome {
        TaskOutcome::Success {
            artifact: Artifact {
                path: PathBuf::from(name),
                size_bytes: 64,
            },
            secondary: Vec::new(),
        }
    }

    #[test]
    fn counts_tally_outcome_tags() {
        let report = AnalysisReport::new(
            "out",
            vec![
                ReportEntry {
                    task: NOTES,
                    outcome: success("notes.mid"),
                },
                ReportEntry {
                    task: CHORDS,
                    outcome: TaskOutcome::hard_failure("model missing"),
                },
                ReportEntry {
                    task: BASS,
                    outcome: TaskOutcome::skipped(),
                },
            ],
        );
        let counts = report.counts();
        assert_eq!(counts.succeeded, 1);
        assert_eq!(counts.hard_failed, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.unsuccessful(), 2);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn soft_failures_do_not_fail_the_exit_code() {
        let report = AnalysisReport::new(
            "out",
            vec![ReportEntry {
                task: NOTES,
                outcome: TaskOutcome::soft_failure(NO_ARTIFACT),
            }],
        );
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn summary_never_lists_missing_artifacts_as_succeeded() {
        let report = AnalysisReport::new(
            "out",
            vec![
                ReportEntry {
                    task: NOTES,
                    outcome: success("notes.mid"),
                },
                ReportEntry {
                    task: CHORDS,
                    outcome: TaskOutcome::soft_failure(NO_ARTIFACT),
                },
            ],
        );
        let summary = report.summary();
        assert!(summary.contains("Fully succeeded (1): Musical notes"));
        assert!(summary.contains("Partially succeeded (ran, no usable output) (1): Chords"));
        assert!(summary.contains("Failed or skipped (0): none"));
        assert!(summary.contains("1 of 2 tasks succeeded"));
    }

    #[test]
    fn artifacts_missing_on_disk_are_not_reported_as_partial() {
        let report = AnalysisReport::new(
            "out",
            vec![
                ReportEntry {
                    task: CHORDS,
                    outcome: TaskOutcome::missing(),
                },
                ReportEntry {
                    task: BASS,
                    outcome: TaskOutcome::missing(),
                },
            ],
        );
        let summary = report.summary();
        assert!(summary.contains("Partially succeeded (ran, no usable output) (0): none"));
        assert!(summary.contains("Failed or skipped (2): Chords, Bass line"));
        assert_eq!(report.counts().missing, 2);
        assert_eq!(report.counts().unsuccessful(), 2);
        assert_eq!(report.exit_code(), 0);
    }
}
