//! Run counters and the end-of-run summary.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Counters maintained by the result aggregator.
///
/// Owned by the aggregator alone; nothing else mutates them during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Every result handled, dropped records included.
    pub total: u64,
    /// Results written to the success sink.
    pub succeeded: u64,
    /// Results written to the failure sink.
    pub failed: u64,
}

impl Counters {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
        self.total += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
        self.total += 1;
    }

    pub fn record_dropped(&mut self) {
        self.total += 1;
    }

    /// Results counted but written to neither sink.
    pub fn dropped(&self) -> u64 {
        self.total
            .saturating_sub(self.succeeded)
            .saturating_sub(self.failed)
    }
}

/// Totals for a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub dropped: u64,
    /// Wall-clock duration from worker start to the final flush.
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(counters: Counters, elapsed: Duration) -> Self {
        Self {
            total: counters.total,
            succeeded: counters.succeeded,
            failed: counters.failed,
            dropped: counters.dropped(),
            elapsed,
        }
    }

    /// Returns the success rate as a percentage of all results.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.total as f64) * 100.0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total:     {}", self.total)?;
        writeln!(
            f,
            "Succeeded: {} ({:.1}%)",
            self.succeeded,
            self.success_rate()
        )?;
        writeln!(f, "Failed:    {}", self.failed)?;
        if self.dropped > 0 {
            writeln!(f, "Dropped:   {}", self.dropped)?;
        }
        write!(f, "Took {:?} to run.", self.elapsed)
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}
