//! Command-line interface for fileforge.
//!
//! Parses the run configuration, prints the banner and summary, and drives
//! a [`crate::pipeline::FileProcessor`] over the configured files.

mod commands;

pub use commands::{init_tracing, parse_cli, run_processor, run_with_cli, Cli};
