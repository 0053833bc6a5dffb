//! Error types for fileforge pipeline runs.
//!
//! Every error in this module is fatal to the run that produced it. Per-record
//! processing failures and sink write failures are not represented here: they
//! are routed to the failure sink or logged, and the run carries on.

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::config::ConfigError;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to open input file '{}': {source}", .path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output file '{}': {source}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input has no header record")]
    MissingHeader,

    #[error("Failed to read input: {0}")]
    Read(#[from] csv::Error),

    #[error("Failed to write header to {sink} sink: {source}")]
    WriteHeader {
        sink: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("Record {index} {record:?} failed validation: {source}")]
    Validation {
        index: u64,
        record: Vec<String>,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to flush {sink} sink: {source}")]
    Flush {
        sink: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Record reader panicked: {0}")]
    ReaderPanicked(String),

    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),
}
