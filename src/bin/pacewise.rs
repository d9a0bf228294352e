//! Pacewise CLI
//!
//! Commands:
//! - score: Process daily interval submissions into readiness scores
//! - validate: Check interval series quality without scoring

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pacewise::pipeline::{DailySubmission, ReadinessProcessor};
use pacewise::validator::clean_series;
use pacewise::{CoreError, EngineConfig, ReadinessScore, ENGINE_VERSION};

/// Pacewise - Physiological readiness engine for ME/CFS pacing
#[derive(Parser)]
#[command(name = "pacewise")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Turn heart interval recordings into daily readiness scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score daily submissions (batch mode)
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Load processor state from file
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Save processor state to file after processing
        #[arg(long)]
        save_state: Option<PathBuf>,
    },

    /// Validate interval series quality without scoring
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one submission per line)
    Ndjson,
    /// JSON array of submissions
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one score per line)
    Ndjson,
    /// JSON array of scores
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PacewiseCliError> {
    match cli.command {
        Commands::Score {
            input,
            output,
            input_format,
            output_format,
            config,
            load_state,
            save_state,
        } => cmd_score(
            &input,
            &output,
            input_format,
            output_format,
            config.as_deref(),
            load_state.as_deref(),
            save_state.as_deref(),
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
    }
}

fn cmd_score(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    load_state: Option<&Path>,
    save_state: Option<&Path>,
) -> Result<(), PacewiseCliError> {
    let submissions = read_submissions(input, input_format)?;
    if submissions.is_empty() {
        return Err(PacewiseCliError::NoSubmissions);
    }

    let engine_config = match config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };

    let mut processor = match load_state {
        Some(path) => ReadinessProcessor::load_state(&fs::read_to_string(path)?)?,
        None => ReadinessProcessor::with_config(engine_config),
    };

    let mut scores: Vec<ReadinessScore> = Vec::with_capacity(submissions.len());
    for submission in &submissions {
        // Refresh the baseline before adding today, so the day being scored
        // never contributes to its own reference
        processor.recompute_baseline();
        let reading = processor.submit_reading(&submission.series)?;
        let score = processor.score_day(reading.recorded_at.date_naive(), &submission.inputs)?;
        scores.push(score);
    }

    if let Some(path) = save_state {
        fs::write(path, processor.save_state()?)?;
    }

    let output_data = format_scores(&scores, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), PacewiseCliError> {
    let submissions = read_submissions(input, input_format)?;
    let config = EngineConfig::default();

    let mut entries: Vec<SeriesReport> = Vec::new();
    for (index, submission) in submissions.iter().enumerate() {
        let entry = match clean_series(&submission.series, &config.validator) {
            Ok(cleaned) => SeriesReport {
                index,
                recorded_at: submission.series.recorded_at.to_rfc3339(),
                total: cleaned.stats.total,
                kept: cleaned.stats.kept,
                rejected: cleaned.stats.rejected,
                rejection_ratio: cleaned.stats.rejection_ratio,
                flagged: cleaned.over_rejection_ceiling(&config.validator),
                error: None,
            },
            Err(e) => SeriesReport {
                index,
                recorded_at: submission.series.recorded_at.to_rfc3339(),
                total: submission.series.intervals_ms.len(),
                kept: 0,
                rejected: 0,
                rejection_ratio: 0.0,
                flagged: false,
                error: Some(e.to_string()),
            },
        };
        entries.push(entry);
    }

    let failed = entries.iter().filter(|e| e.error.is_some()).count();
    let report = ValidationReport {
        total_series: entries.len(),
        usable_series: entries.len() - failed,
        failed_series: failed,
        series: entries,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total series:  {}", report.total_series);
        println!("Usable series: {}", report.usable_series);
        println!("Failed series: {}", report.failed_series);
        for entry in &report.series {
            match &entry.error {
                Some(error) => {
                    println!("  - Series {} ({}): {}", entry.index, entry.recorded_at, error)
                }
                None => println!(
                    "  - Series {} ({}): kept {}/{} ({:.1}% rejected){}",
                    entry.index,
                    entry.recorded_at,
                    entry.kept,
                    entry.total,
                    entry.rejection_ratio * 100.0,
                    if entry.flagged { " [POOR]" } else { "" },
                ),
            }
        }
    }

    if report.failed_series > 0 {
        Err(PacewiseCliError::ValidationFailed(report.failed_series))
    } else {
        Ok(())
    }
}

fn read_submissions(
    input: &Path,
    format: InputFormat,
) -> Result<Vec<DailySubmission>, PacewiseCliError> {
    let data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    match format {
        InputFormat::Ndjson => data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).map_err(PacewiseCliError::from))
            .collect(),
        InputFormat::Json => Ok(serde_json::from_str(&data)?),
    }
}

fn format_scores(
    scores: &[ReadinessScore],
    format: &OutputFormat,
) -> Result<String, PacewiseCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for score in scores {
                lines.push(serde_json::to_string(score)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(scores)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(scores)?),
    }
}

// Error types

#[derive(Debug)]
enum PacewiseCliError {
    Io(io::Error),
    Core(CoreError),
    Json(serde_json::Error),
    NoSubmissions,
    ValidationFailed(usize),
}

impl From<io::Error> for PacewiseCliError {
    fn from(e: io::Error) -> Self {
        PacewiseCliError::Io(e)
    }
}

impl From<CoreError> for PacewiseCliError {
    fn from(e: CoreError) -> Self {
        PacewiseCliError::Core(e)
    }
}

impl From<serde_json::Error> for PacewiseCliError {
    fn from(e: serde_json::Error) -> Self {
        PacewiseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PacewiseCliError> for CliError {
    fn from(e: PacewiseCliError) -> Self {
        match e {
            PacewiseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PacewiseCliError::Core(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'pacewise validate' to inspect the input series".to_string()),
            },
            PacewiseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PacewiseCliError::NoSubmissions => CliError {
                code: "NO_SUBMISSIONS".to_string(),
                message: "No submissions found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            PacewiseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} series failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_series: usize,
    usable_series: usize,
    failed_series: usize,
    series: Vec<SeriesReport>,
}

#[derive(serde::Serialize)]
struct SeriesReport {
    index: usize,
    recorded_at: String,
    total: usize,
    kept: usize,
    rejected: usize,
    rejection_ratio: f64,
    flagged: bool,
    error: Option<String>,
}
