use serde::{Deserialize, Serialize};

use crate::{error::DomainError, report::AnalysisReport};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Text,
    Json,
}

pub trait ReportExporter {
    fn export(&self, report: &AnalysisReport, format: ExportFormat)
        -> Result<Vec<u8>, DomainError>;
}

pub struct JsonExporter;

impl ReportExporter for JsonExporter {
    fn export(
        &self,
        report: &AnalysisReport,
        format: ExportFormat,
    ) -> Result<Vec<u8>, DomainError> {
        match format {
            ExportFormat::Json => serde_json::to_vec_pretty(report)
                .map_err(|err| DomainError::Serialization(err.to_string())),
            other => Err(DomainError::validation(format!(
                "JsonExporter cannot handle {:?}",
                other
            ))),
        }
    }
}

pub struct TextExporter;

impl ReportExporter for TextExporter {
    fn export(
        &self,
        report: &AnalysisReport,
        format: ExportFormat,
    ) -> Result<Vec<u8>, DomainError> {
        match format {
            ExportFormat::Text => Ok(report.summary().into_bytes()),
            other => Err(DomainError::validation(format!(
                "TextExporter cannot handle {:?}",
                other
            ))),
        }
    }
}

/// Renders a report with whichever exporter handles `format`.
pub fn export(report: &AnalysisReport, format: ExportFormat) -> Result<Vec<u8>, DomainError> {
    match format {
        ExportFormat::Json => JsonExporter.export(report, format),
        ExportFormat::Text => TextExporter.export(report, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Capability, ReportEntry, Role, TaskOutcome, TranscriptionTask};

    fn report() -> AnalysisReport {
        AnalysisReport::new(
            "analysis_results",
            vec![ReportEntry {
                task: TranscriptionTask::simple(
                    "Bass line",
                    Role::Bass,
                    Capability::Music,
                    "bass_line.mid",
                ),
                outcome: TaskOutcome::skipped(),
            }],
        )
    }

    #[test]
    fn exports_json() {
        let bytes = JsonExporter.export(&report(), ExportFormat::Json).unwrap();
        let output = String::from_utf8(bytes).unwrap();
        assert!(output.contains("\"status\": \"skipped\""));
        assert!(output.contains("\"required_role\": \"bass\""));
        assert!(output.contains("\"skipped\": 1"));
    }

    #[test]
    fn exporters_reject_foreign_formats() {
        assert!(JsonExporter.export(&report(), ExportFormat::Text).is_err());
        assert!(TextExporter.export(&report(), ExportFormat::Json).is_err());
    }

    #[test]
    fn export_dispatches_on_format() {
        let text = String::from_utf8(export(&report(), ExportFormat::Text).unwrap()).unwrap();
        assert!(text.contains("Failed or skipped (1): Bass line"));
    }
}
