//! Result aggregator: routes processed records to the sinks.
//!
//! The aggregator is the only consumer of the output queue and the only
//! writer of both sinks and of the run counters, so none of them need
//! synchronization.

use std::io::Write;

use tracing::{error, info, warn};

use super::processor::RecordProcessor;
use super::record::{Outcome, RecordResult};
use super::sink::RecordSink;
use super::summary::Counters;

/// Routes results, counts them and flushes the sinks in batches.
pub struct ResultAggregator<'a, P: ?Sized, S: Write, F: Write> {
    processor: &'a P,
    success: &'a mut RecordSink<S>,
    failure: &'a mut RecordSink<F>,
    show_description: bool,
    flush_batch: u64,
    counters: Counters,
}

impl<'a, P, S, F> ResultAggregator<'a, P, S, F>
where
    P: RecordProcessor + ?Sized,
    S: Write,
    F: Write,
{
    /// Creates an aggregator writing to the given sinks.
    ///
    /// `flush_batch` must be non-zero.
    pub fn new(
        processor: &'a P,
        success: &'a mut RecordSink<S>,
        failure: &'a mut RecordSink<F>,
        show_description: bool,
        flush_batch: u64,
    ) -> Self {
        Self {
            processor,
            success,
            failure,
            show_description,
            flush_batch,
            counters: Counters::default(),
        }
    }

    /// Returns the counters so far.
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Routes one result to its sink and reports progress.
    ///
    /// Sink write failures are logged and otherwise ignored; the record is
    /// still counted.
    pub fn handle(&mut self, result: RecordResult) {
        let RecordResult { input, output } = result;
        let ident = self.processor.identify(&input);

        match output.outcome() {
            Outcome::Success => {
                if let Err(e) = self.success.write_row(&input.line) {
                    error!(id = ident.id, sink = self.success.name(), error = %e, "Failed to write record");
                }
                self.counters.record_success();
            }
            Outcome::Failure(err) => {
                let written = if self.show_description {
                    let description = format!("{err:#}");
                    self.failure.write_row(
                        input
                            .line
                            .iter()
                            .map(String::as_str)
                            .chain(std::iter::once(description.as_str())),
                    )
                } else {
                    self.failure.write_row(&input.line)
                };
                if let Err(e) = written {
                    error!(id = ident.id, sink = self.failure.name(), error = %e, "Failed to write record");
                }
                self.counters.record_failure();
            }
            Outcome::Dropped => self.counters.record_dropped(),
        }

        let count = self.counters.total;
        if count % self.flush_batch == 0 {
            self.flush_all();
        }

        info!(
            count = count,
            failure = output.error().is_some(),
            description = %ident.description,
            id = ident.id,
            "Processed record"
        );
    }

    /// Flushes both sinks, logging failures.
    fn flush_all(&mut self) {
        if let Err(e) = self.success.flush() {
            warn!(sink = self.success.name(), error = %e, "Batch flush failed");
        }
        if let Err(e) = self.failure.flush() {
            warn!(sink = self.failure.name(), error = %e, "Batch flush failed");
        }
    }

    /// Performs the final flush of both sinks and returns the counters.
    ///
    /// A sink that cannot be flushed is logged; its rows may be lost but the
    /// counters are still reported.
    pub fn finish(self) -> Counters {
        let Self {
            success,
            failure,
            counters,
            ..
        } = self;

        for (name, result) in [
            (success.name(), success.flush()),
            (failure.name(), failure.flush()),
        ] {
            if let Err(e) = result {
                error!(sink = name, error = %e, "Final flush failed");
            }
        }

        counters
    }
}
