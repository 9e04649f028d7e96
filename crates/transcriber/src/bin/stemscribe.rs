use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use stemscribe_audio::SourceKind;
use stemscribe_domain::{AnalysisReport, ExportFormat, StemSet};
use stemscribe_transcriber::catalog::{capabilities, CatalogKind};
use stemscribe_transcriber::checkpoints::{checkpoint_status, warn_missing};
use stemscribe_transcriber::{
    load_config, Config, RunError, TranscriptionJob, TranscriptionPipeline,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const REPORT_FILE: &str = "analysis_report.json";

#[derive(Parser, Debug)]
#[command(author, version, about = "Transcribe notes, vocal melody and chords from a mix or its stems", long_about = None)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every catalog task against a mixed recording or a stem directory
    Run {
        /// Audio file or directory of separated stems
        input: PathBuf,
        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Task catalog; `auto` picks it from the input kind
        #[arg(long, value_enum, default_value_t = CatalogArg::Auto)]
        catalog: CatalogArg,
        #[arg(short, long, value_enum, default_value_t = FormatArg::Text)]
        format: FormatArg,
    },
    /// Report on the artifacts a previous run left in an output directory
    Inspect {
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = CatalogArg::Mix)]
        catalog: CatalogArg,
        #[arg(short, long, value_enum, default_value_t = FormatArg::Text)]
        format: FormatArg,
    },
    /// List the model checkpoints and whether they are installed
    Checkpoints,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CatalogArg {
    Auto,
    Mix,
    Stems,
}

impl CatalogArg {
    fn select(self, detected: CatalogKind) -> CatalogKind {
        match self {
            CatalogArg::Auto => detected,
            CatalogArg::Mix => CatalogKind::Mix,
            CatalogArg::Stems => CatalogKind::Stems,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ExportFormat::Text,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            input,
            output,
            catalog,
            format,
        } => run(&config, input, output, catalog, format).await,
        Command::Inspect {
            output,
            catalog,
            format,
        } => {
            let pipeline = TranscriptionPipeline::from_config(&config);
            let report = pipeline.inspect(&output, catalog.select(CatalogKind::Mix).tasks());
            print_report(&report, format)?;
            Ok(ExitCode::from(report.exit_code()))
        }
        Command::Checkpoints => {
            print_checkpoints(&config.checkpoint_dir);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(
    config: &Config,
    input: PathBuf,
    output: Option<PathBuf>,
    catalog: CatalogArg,
    format: FormatArg,
) -> anyhow::Result<ExitCode> {
    let Some(detected) = CatalogKind::for_source(SourceKind::classify(&input)) else {
        eprintln!("Error: input not found: {}", input.display());
        return Ok(ExitCode::from(2));
    };
    let tasks = catalog.select(detected).tasks();
    warn_missing(&config.checkpoint_dir, &capabilities(tasks));

    let pipeline = TranscriptionPipeline::from_config(config);
    let job = TranscriptionJob {
        source: input,
        output_dir: output.unwrap_or_else(|| config.output_dir.clone()),
    };
    let stems = pipeline.resolve(&job, tasks);
    describe_inputs(&stems);

    let report = match pipeline.transcribe_stems(&job, &stems, tasks).await {
        Ok(report) => report,
        Err(RunError::CapabilityUnavailable(err)) => {
            eprintln!("Error: transcription capability unavailable: {err}");
            return Ok(ExitCode::from(2));
        }
        Err(other) => return Err(other.into()),
    };

    let report_path = job.output_dir.join(REPORT_FILE);
    let json = stemscribe_domain::io::export(&report, ExportFormat::Json)?;
    std::fs::write(&report_path, json)
        .with_context(|| format!("write report {}", report_path.display()))?;
    info!(path = %report_path.display(), "report written");

    print_report(&report, format)?;
    Ok(ExitCode::from(report.exit_code()))
}

fn describe_inputs(stems: &StemSet) {
    let distinct: BTreeSet<&Path> = stems.iter().map(|(_, path)| path).collect();
    for path in distinct {
        match stemscribe_audio::probe(path) {
            Ok(media) => info!(input = %path.display(), "{}", media.describe()),
            Err(err) => warn!(input = %path.display(), "could not probe input: {:#}", err),
        }
    }
}

fn print_report(report: &AnalysisReport, format: FormatArg) -> anyhow::Result<()> {
    let bytes = stemscribe_domain::io::export(report, format.into())?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    if matches!(format, FormatArg::Json) {
        writeln!(stdout)?;
    }
    Ok(())
}

fn print_checkpoints(root: &Path) {
    println!("Checkpoint root: {}", root.display());
    for status in checkpoint_status(root) {
        match status.size_bytes {
            Some(size) => println!(
                "  present  {:<14} {:<14} {} bytes",
                status.name, status.capability, size
            ),
            None => println!(
                "  missing  {:<14} {:<14} {}",
                status.name,
                status.capability,
                status.path.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_catalog(args: &[&str]) -> CatalogArg {
        match Cli::try_parse_from(args).unwrap().command {
            Command::Run { catalog, .. } => catalog,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn run_catalog_defaults_to_auto() {
        let catalog = run_catalog(&["stemscribe", "run", "song.mp3"]);
        assert!(matches!(catalog, CatalogArg::Auto));
        assert_eq!(catalog.select(CatalogKind::Stems), CatalogKind::Stems);
    }

    #[test]
    fn explicit_catalog_overrides_detection() {
        let catalog = run_catalog(&["stemscribe", "run", "stems/", "--catalog", "mix"]);
        assert_eq!(catalog.select(CatalogKind::Stems), CatalogKind::Mix);
        let auto = run_catalog(&["stemscribe", "run", "song.mp3", "--catalog", "auto"]);
        assert_eq!(auto.select(CatalogKind::Mix), CatalogKind::Mix);
    }
}
