//! The capability contract implemented by pipeline callers.

use async_trait::async_trait;

use super::record::{Identifier, Input, Output};

/// Caller-supplied record logic.
///
/// One instance is shared by every worker, so `process` is invoked
/// concurrently from many tasks. Implementations must tolerate that without
/// external locking; the pipeline adds none.
#[async_trait]
pub trait RecordProcessor: Send + Sync {
    /// Structural check run on each data record before it is queued.
    ///
    /// An error here aborts the whole run.
    fn validate(&self, record: &[String]) -> anyhow::Result<()>;

    /// Describes a record for progress and error logs. Must be side-effect free.
    fn identify(&self, input: &Input) -> Identifier;

    /// Transforms one record.
    async fn process(&self, input: &Input) -> Output;

    /// Receives the configured credential, once, before the run starts.
    ///
    /// Not called when no credential is configured.
    fn set_credential(&mut self, _token: &str) {}
}
