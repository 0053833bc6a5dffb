//! A processor that accepts every non-blank record unchanged.
//!
//! Used by the `fileforge` binary to check an input file end to end: every
//! record is read, validated and written to the success sink, so the run
//! reports structural problems in the file without any business logic.

use async_trait::async_trait;

use crate::pipeline::{Identifier, Input, Output, RecordProcessor};

/// Echoes every record to the success sink.
#[derive(Debug, Default, Clone)]
pub struct PassthroughProcessor;

#[async_trait]
impl RecordProcessor for PassthroughProcessor {
    fn validate(&self, record: &[String]) -> anyhow::Result<()> {
        if record.iter().all(|field| field.trim().is_empty()) {
            anyhow::bail!("record has no values");
        }
        Ok(())
    }

    /// Uses the first column as the id when it is numeric, the 1-based
    /// record position otherwise.
    fn identify(&self, input: &Input) -> Identifier {
        let id = input
            .field(0)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(input.index + 1);
        Identifier::new("record", id)
    }

    async fn process(&self, input: &Input) -> Output {
        Output::success(input.line.clone())
    }
}
