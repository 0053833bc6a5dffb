//! fileforge: concurrent CSV record pipeline.
//!
//! Reads delimited records, validates them, processes them across a bounded
//! worker pool with caller-supplied logic and routes the results to success
//! and failure CSV files while counting them.
//!
//! Callers implement [`pipeline::RecordProcessor`] and either drive a
//! [`pipeline::FileProcessor`] directly or hand their processor to
//! [`cli::run_processor`] for a complete command-line program.

pub mod cli;
pub mod error;
pub mod passthrough;
pub mod pipeline;
pub mod scheduler;

pub use error::PipelineError;
pub use pipeline::{
    FileProcessor, Identifier, Input, Output, PipelineConfig, RecordProcessor, RunSummary,
};
