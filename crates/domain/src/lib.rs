pub mod error;
pub mod io;
pub mod outcome;
pub mod report;
pub mod role;
pub mod task;

pub use crate::error::DomainError;
pub use crate::io::{ExportFormat, ReportExporter};
pub use crate::outcome::{Artifact, TaskOutcome};
pub use crate::report::{AnalysisReport, ReportCounts, ReportEntry};
pub use crate::role::{ResolutionGap, Role, StemSet};
pub use crate::task::{Capability, TranscriptionTask};
