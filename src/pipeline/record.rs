//! Record types flowing through the pipeline.
//!
//! - `Input`: one admitted record, before processing
//! - `Output`: what the processor made of it
//! - `RecordResult`: an `Input` paired with its `Output`
//! - `Identifier`: a human-readable label for progress and error logs

use std::fmt;

/// One admitted input record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Zero-based position among the data records (the header is not counted).
    pub index: u64,
    /// Field values in input order.
    pub line: Vec<String>,
}

impl Input {
    /// Creates a new input record.
    pub fn new(index: u64, line: Vec<String>) -> Self {
        Self { index, line }
    }

    /// Returns the field at `column`, if present.
    pub fn field(&self, column: usize) -> Option<&str> {
        self.line.get(column).map(String::as_str)
    }
}

/// The processed form of one `Input`.
///
/// A successful output never carries an error. An unsuccessful output with
/// an error is a reported failure; an unsuccessful output without one is
/// dropped: it counts toward the total but is written to neither sink.
#[derive(Debug)]
pub struct Output {
    line: Vec<String>,
    error: Option<anyhow::Error>,
    success: bool,
}

impl Output {
    /// Creates a successful output.
    pub fn success(line: Vec<String>) -> Self {
        Self {
            line,
            error: None,
            success: true,
        }
    }

    /// Creates a failed output carrying the reason.
    pub fn failure(line: Vec<String>, error: impl Into<anyhow::Error>) -> Self {
        Self {
            line,
            error: Some(error.into()),
            success: false,
        }
    }

    /// Creates an output that is counted but written nowhere.
    pub fn dropped(line: Vec<String>) -> Self {
        Self {
            line,
            error: None,
            success: false,
        }
    }

    /// Returns the transformed fields.
    pub fn line(&self) -> &[String] {
        &self.line
    }

    /// Returns the processing error, if any.
    pub fn error(&self) -> Option<&anyhow::Error> {
        self.error.as_ref()
    }

    /// Whether processing succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Classifies the output for routing.
    pub fn outcome(&self) -> Outcome<'_> {
        match (&self.error, self.success) {
            (_, true) => Outcome::Success,
            (Some(err), false) => Outcome::Failure(err),
            (None, false) => Outcome::Dropped,
        }
    }
}

/// Routing decision for a processed record.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    /// Goes to the success sink.
    Success,
    /// Goes to the failure sink.
    Failure(&'a anyhow::Error),
    /// Goes nowhere.
    Dropped,
}

/// An input paired with the output produced for it.
#[derive(Debug)]
pub struct RecordResult {
    pub input: Input,
    pub output: Output,
}

impl RecordResult {
    pub fn new(input: Input, output: Output) -> Self {
        Self { input, output }
    }
}

/// Description and numeric id of a record, for reporting only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub description: String,
    pub id: u64,
}

impl Identifier {
    pub fn new(description: impl Into<String>, id: u64) -> Self {
        Self {
            description: description.into(),
            id,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.description, self.id)
    }
}
