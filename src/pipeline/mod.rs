//! The record pipeline.
//!
//! A run reads CSV records, validates each one with a caller-supplied
//! [`RecordProcessor`], processes the admitted records on a pool of workers
//! and routes every result to a success or failure sink.
//!
//! # Components
//!
//! - **Source**: reads records, passes the header through, validates
//! - **Processor**: the caller's validation, identification and transformation
//! - **Aggregator**: routes results, counts them and flushes the sinks
//! - **Sink**: buffered CSV output
//! - **Orchestrator**: runs the stages and returns the [`RunSummary`]
//!
//! # Example
//!
//! ```rust,ignore
//! use fileforge::pipeline::{FileProcessor, PipelineConfig, FAILURE_SINK_PATH};
//!
//! let config = PipelineConfig::new().with_threads(8).with_show_description(true);
//! let processor = FileProcessor::new(MyProcessor::default(), config)?;
//!
//! let summary = processor
//!     .run_files("input.csv", "output.csv", FAILURE_SINK_PATH)
//!     .await?;
//! println!("{summary}");
//! ```
//!
//! # Failure policy
//!
//! A record rejected by `validate`, an unreadable record or a missing header
//! aborts the run. A record whose processing fails is written to the failure
//! sink and the run continues. Results may arrive in any order when more
//! than one worker is configured.

pub mod aggregator;
pub mod config;
pub mod orchestrator;
pub mod processor;
pub mod record;
pub mod sink;
pub mod source;
pub mod summary;

pub use aggregator::ResultAggregator;
pub use config::{
    ConfigError, PipelineConfig, DEFAULT_FLUSH_BATCH, DEFAULT_QUEUE_CAPACITY, DEFAULT_THREADS,
    ERROR_DESCRIPTION_COLUMN, FAILURE_SINK_PATH,
};
pub use orchestrator::FileProcessor;
pub use processor::RecordProcessor;
pub use record::{Identifier, Input, Outcome, Output, RecordResult};
pub use sink::RecordSink;
pub use source::RowSource;
pub use summary::{Counters, RunSummary};
