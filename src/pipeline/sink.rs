//! Buffered CSV output sinks.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::PipelineError;

/// A buffered CSV destination for routed records.
///
/// Rows are buffered by the underlying `csv::Writer`; they reach the backing
/// writer only on [`RecordSink::flush`] or when the internal buffer fills.
pub struct RecordSink<W: Write> {
    name: &'static str,
    writer: csv::Writer<W>,
    rows_written: u64,
    flushes: u64,
}

impl RecordSink<File> {
    /// Creates (or truncates) the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::CreateOutput` if the file cannot be created.
    pub fn create(name: &'static str, path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| PipelineError::CreateOutput {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(name, file))
    }
}

impl<W: Write> RecordSink<W> {
    /// Wraps `inner` in a CSV writer. `name` labels the sink in logs and errors.
    pub fn new(name: &'static str, inner: W) -> Self {
        Self {
            name,
            writer: csv::WriterBuilder::new().flexible(true).from_writer(inner),
            rows_written: 0,
            flushes: 0,
        }
    }

    /// Returns the sink's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Buffers one row.
    pub fn write_row<I, T>(&mut self, row: I) -> csv::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer.write_record(row)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Pushes buffered rows to the backing writer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()?;
        self.flushes += 1;
        Ok(())
    }

    /// Number of rows accepted so far, header included.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Number of successful flushes so far.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// Flushes and returns the backing writer.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Flush` if buffered rows cannot be written.
    pub fn into_inner(self) -> Result<W, PipelineError> {
        let name = self.name;
        self.writer.into_inner().map_err(|e| PipelineError::Flush {
            sink: name,
            source: std::io::Error::new(e.error().kind(), e.error().to_string()),
        })
    }
}
