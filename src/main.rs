//! fileforge CLI entry point.
//!
//! Runs the pipeline with the pass-through processor, which checks that an
//! input file can be read and validated end to end.

use fileforge::passthrough::PassthroughProcessor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first to get log_level
    let cli = fileforge::cli::parse_cli();

    fileforge::cli::init_tracing(&cli.log_level);

    fileforge::cli::run_with_cli(cli, PassthroughProcessor).await
}
