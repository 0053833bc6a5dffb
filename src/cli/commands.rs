//! CLI argument definitions and the run command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::pipeline::{
    FileProcessor, PipelineConfig, RecordProcessor, RunSummary, DEFAULT_THREADS,
    FAILURE_SINK_PATH,
};

const BANNER_RULE: &str = "---------------------------------------------------------------";

/// Concurrent CSV record processor.
#[derive(Parser, Debug)]
#[command(name = "fileforge")]
#[command(about = "Validate, process and route CSV records across a worker pool")]
#[command(version)]
#[command(
    long_about = "fileforge reads a CSV file, processes every record on a pool of workers and writes \
successful records to the output file and failed ones to failures.csv in the working directory.\n\n\
Example usage:\n  fileforge --input-path users.csv --output-path processed.csv --threads 10"
)]
pub struct Cli {
    /// Input CSV file.
    #[arg(long, env = "FILEFORGE_INPUT_PATH")]
    pub input_path: PathBuf,

    /// Output CSV file for successfully processed records.
    #[arg(long, env = "FILEFORGE_OUTPUT_PATH")]
    pub output_path: PathBuf,

    /// Number of parallel workers.
    #[arg(long, env = "FILEFORGE_THREADS", default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Whether the first input record is a header.
    #[arg(
        long,
        env = "FILEFORGE_HAS_HEADER",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub has_header: bool,

    /// Access token handed to the processor before the run.
    #[arg(long, env = "FILEFORGE_TOKEN", default_value = "")]
    pub token: String,

    /// Append an error_description column to failures.csv.
    #[arg(long, env = "FILEFORGE_SHOW_DESCRIPTION")]
    pub show_description: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Output the run summary as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

impl Cli {
    /// Builds the pipeline configuration from the parsed arguments.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_threads(self.threads)
            .with_header(self.has_header)
            .with_show_description(self.show_description)
            .with_token(self.token.clone())
    }
}

/// Parse CLI arguments.
///
/// Exits with status 2 when a required argument is missing.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Initialize tracing with an environment filter.
///
/// Priority: RUST_LOG env var > `log_level` > default "info".
pub fn init_tracing(log_level: &str) {
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)))
        .init();
}

/// Parse the command line, initialize logging and run `processor`.
///
/// This is the whole program for a binary that supplies its own
/// [`RecordProcessor`]:
///
/// ```rust,ignore
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     fileforge::cli::run_processor(MyProcessor::default()).await
/// }
/// ```
pub async fn run_processor<P>(processor: P) -> anyhow::Result<()>
where
    P: RecordProcessor + 'static,
{
    let cli = parse_cli();
    init_tracing(&cli.log_level);
    run_with_cli(cli, processor).await
}

/// Run `processor` with already parsed arguments.
pub async fn run_with_cli<P>(cli: Cli, processor: P) -> anyhow::Result<()>
where
    P: RecordProcessor + 'static,
{
    let file_processor = FileProcessor::new(processor, cli.pipeline_config())?;

    print_banner(&cli, file_processor.config());

    let summary = file_processor
        .run_files(&cli.input_path, &cli.output_path, FAILURE_SINK_PATH)
        .await
        .with_context(|| format!("Processing {} failed", cli.input_path.display()))?;

    print_summary(&summary, cli.json)?;
    Ok(())
}

fn print_banner(cli: &Cli, config: &PipelineConfig) {
    println!("{BANNER_RULE}");
    println!("Process started");
    println!("{BANNER_RULE}");
    println!("input file path: {}", cli.input_path.display());
    println!("output file path: {}", cli.output_path.display());
    println!("failures file path: {FAILURE_SINK_PATH}");
    println!("number of parallel executions: {}", config.threads);
    println!("header presence: {}", config.has_header);
    println!("show error description: {}", config.show_description);
    if let Some(token) = config.credential() {
        println!("token: {token}");
    }
    println!("{BANNER_RULE}");
    println!();

    info!(
        input = %cli.input_path.display(),
        output = %cli.output_path.display(),
        threads = config.threads,
        "Starting run"
    );
}

fn print_summary(summary: &RunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!();
        println!("{summary}");
    }
    Ok(())
}
