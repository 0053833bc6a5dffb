//! Pipeline configuration.
//!
//! Holds the knobs of a single run: worker pool size, header handling,
//! failure sink layout, the optional processor credential and the sizes of
//! the bounded queues and flush batches.

use thiserror::Error;

/// Default number of parallel workers.
pub const DEFAULT_THREADS: usize = 25;

/// Capacity of each of the two bounded queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Number of aggregated results between two sink flushes.
pub const DEFAULT_FLUSH_BATCH: u64 = 100;

/// Name of the trailing column added to the failure sink header when error
/// descriptions are shown.
pub const ERROR_DESCRIPTION_COLUMN: &str = "error_description";

/// Fixed location of the failure sink, relative to the working directory.
pub const FAILURE_SINK_PATH: &str = "failures.csv";

/// Errors that can occur while building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of worker tasks processing records concurrently.
    pub threads: usize,
    /// Whether the first input record is a header to pass through.
    pub has_header: bool,
    /// Whether failure rows carry the error description as an extra column.
    pub show_description: bool,
    /// Credential handed to the processor before the run, if non-empty.
    pub token: String,
    /// Capacity of the input and output queues.
    pub queue_capacity: usize,
    /// Results handled between periodic flushes of both sinks.
    pub flush_batch: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            has_header: true,
            show_description: false,
            token: String::new(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            flush_batch: DEFAULT_FLUSH_BATCH,
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a size is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "threads".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "queue_capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.flush_batch == 0 {
            return Err(ConfigError::InvalidValue {
                key: "flush_batch".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the credential, or `None` when none was configured.
    pub fn credential(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }

    /// Builder method to set the worker count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Builder method to set header handling.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Builder method to enable or disable the error description column.
    pub fn with_show_description(mut self, show: bool) -> Self {
        self.show_description = show;
        self
    }

    /// Builder method to set the processor credential.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Builder method to set the queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Builder method to set the flush batch size.
    pub fn with_flush_batch(mut self, batch: u64) -> Self {
        self.flush_batch = batch;
        self
    }
}
