//! Pipeline orchestrator wiring the stages of one run together.
//!
//! ```text
//!   RowSource ──► input queue ──► WorkerPool (N) ──► output queue ──► ResultAggregator
//!  (blocking)      (bounded)                          (bounded)        │           │
//!                                                                  success     failure
//! ```
//!
//! The orchestrator is the only place that decides whether a run failed.
//! Fatal errors from any stage are returned to the caller; nothing in the
//! pipeline terminates the process.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::PipelineError;
use crate::scheduler::queue::{bounded, bounded_shared};
use crate::scheduler::worker_pool::WorkerPool;

use super::aggregator::ResultAggregator;
use super::config::{PipelineConfig, ERROR_DESCRIPTION_COLUMN};
use super::processor::RecordProcessor;
use super::sink::RecordSink;
use super::source::RowSource;
use super::summary::RunSummary;

/// Runs CSV input through a [`RecordProcessor`].
pub struct FileProcessor<P: RecordProcessor> {
    processor: Arc<P>,
    config: PipelineConfig,
}

impl<P: RecordProcessor + 'static> FileProcessor<P> {
    /// Creates a processor for the given configuration.
    ///
    /// The configured credential, if any, is handed to `processor` here,
    /// before it is shared with the workers.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the configuration is invalid.
    pub fn new(mut processor: P, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        if let Some(token) = config.credential() {
            processor.set_credential(token);
        }

        Ok(Self {
            processor: Arc::new(processor),
            config,
        })
    }

    /// Returns the run configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the shared processor.
    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Opens the input and both sink files, then runs the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::OpenInput` or `PipelineError::CreateOutput`
    /// if a file cannot be opened, and any error [`FileProcessor::run`]
    /// returns.
    pub async fn run_files(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        failure_path: impl AsRef<Path>,
    ) -> Result<RunSummary, PipelineError> {
        let input_path = input_path.as_ref();
        let input = File::open(input_path).map_err(|source| PipelineError::OpenInput {
            path: input_path.to_path_buf(),
            source,
        })?;

        let mut success = RecordSink::create("success", output_path)?;
        let mut failure = RecordSink::create("failure", failure_path)?;

        self.run(BufReader::new(input), &mut success, &mut failure)
            .await
    }

    /// Runs the pipeline over `input`, routing records to the two sinks.
    ///
    /// Both sinks are flushed after every batch and once at the end of a
    /// successful run. Sink write and flush failures are logged and do not
    /// fail the run. After a fatal error the final flush is skipped; rows
    /// still buffered reach the backing writer only when the sink is
    /// dropped, and write errors at that point are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: a header, read or validation error
    /// from the input, or a worker panic.
    pub async fn run<R, S, F>(
        &self,
        input: R,
        success: &mut RecordSink<S>,
        failure: &mut RecordSink<F>,
    ) -> Result<RunSummary, PipelineError>
    where
        R: Read + Send + 'static,
        S: Write,
        F: Write,
    {
        let mut source = RowSource::new(input);

        if self.config.has_header {
            let header = source.read_header()?;
            self.write_headers(&header, success, failure)?;
        }

        let start = Instant::now();
        let (input_tx, input_rx) = bounded_shared(self.config.queue_capacity);
        let (result_tx, mut result_rx) = bounded(self.config.queue_capacity);

        let pool = WorkerPool::start(
            self.config.threads,
            Arc::clone(&self.processor),
            input_rx,
            result_tx,
        );

        let processor = Arc::clone(&self.processor);
        let mut reader = tokio::task::spawn_blocking(move || source.feed(&*processor, input_tx));
        let mut reader_done = false;

        let mut aggregator = ResultAggregator::new(
            self.processor.as_ref(),
            success,
            failure,
            self.config.show_description,
            self.config.flush_batch,
        );

        info!("Waiting for results");
        loop {
            tokio::select! {
                joined = &mut reader, if !reader_done => {
                    reader_done = true;
                    if let Err(e) = reader_outcome(joined) {
                        pool.abort();
                        return Err(e);
                    }
                }
                next = result_rx.recv() => match next {
                    Some(result) => aggregator.handle(result),
                    None => break,
                },
            }
        }

        // The output queue can close before the reader's exit was observed.
        if !reader_done {
            reader_outcome(reader.await)?;
        }

        pool.join().await?;
        let counters = aggregator.finish();
        let summary = RunSummary::new(counters, start.elapsed());

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            dropped = summary.dropped,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Pipeline finished"
        );

        Ok(summary)
    }

    /// Writes the header to the success sink, and to the failure sink with
    /// the optional description column.
    fn write_headers<S: Write, F: Write>(
        &self,
        header: &[String],
        success: &mut RecordSink<S>,
        failure: &mut RecordSink<F>,
    ) -> Result<(), PipelineError> {
        success
            .write_row(header)
            .map_err(|source| PipelineError::WriteHeader {
                sink: success.name(),
                source,
            })?;

        let written = if self.config.show_description {
            failure.write_row(
                header
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(ERROR_DESCRIPTION_COLUMN)),
            )
        } else {
            failure.write_row(header)
        };
        written.map_err(|source| PipelineError::WriteHeader {
            sink: failure.name(),
            source,
        })
    }
}

/// Maps the reader task's exit to the run's outcome.
fn reader_outcome(
    joined: Result<Result<u64, PipelineError>, tokio::task::JoinError>,
) -> Result<(), PipelineError> {
    match joined {
        Ok(Ok(admitted)) => {
            debug!(admitted = admitted, "Reader finished");
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(e) => Err(PipelineError::ReaderPanicked(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::record::{Identifier, Input, Output};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Succeeds on every record and remembers the credential it was given.
    #[derive(Default)]
    struct AlwaysOk {
        token: Option<String>,
        credential_calls: AtomicUsize,
    }

    #[async_trait]
    impl RecordProcessor for AlwaysOk {
        fn validate(&self, _record: &[String]) -> anyhow::Result<()> {
            Ok(())
        }

        fn identify(&self, input: &Input) -> Identifier {
            Identifier::new("row", input.index)
        }

        async fn process(&self, input: &Input) -> Output {
            Output::success(input.line.clone())
        }

        fn set_credential(&mut self, token: &str) {
            self.credential_calls.fetch_add(1, Ordering::SeqCst);
            self.token = Some(token.to_string());
        }
    }

    /// Rejects "invalid" during validation and records every processed id.
    #[derive(Default)]
    struct Strict {
        processed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RecordProcessor for Strict {
        fn validate(&self, record: &[String]) -> anyhow::Result<()> {
            if record[0] == "invalid" {
                anyhow::bail!("unexpected value");
            }
            Ok(())
        }

        fn identify(&self, input: &Input) -> Identifier {
            Identifier::new("row", input.index)
        }

        async fn process(&self, input: &Input) -> Output {
            self.processed
                .lock()
                .expect("lock")
                .push(input.line[0].clone());
            Output::success(input.line.clone())
        }
    }

    fn sinks() -> (RecordSink<Vec<u8>>, RecordSink<Vec<u8>>) {
        (
            RecordSink::new("success", Vec::new()),
            RecordSink::new("failure", Vec::new()),
        )
    }

    fn lines(sink: RecordSink<Vec<u8>>) -> Vec<String> {
        let bytes = sink.into_inner().expect("into_inner");
        String::from_utf8(bytes)
            .expect("utf8")
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_credential_applied_once_when_present() {
        let fp = FileProcessor::new(AlwaysOk::default(), PipelineConfig::new().with_token("t0k"))
            .expect("valid config");

        assert_eq!(fp.processor().token.as_deref(), Some("t0k"));
        assert_eq!(fp.processor().credential_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_credential_skipped_when_empty() {
        let fp = FileProcessor::new(AlwaysOk::default(), PipelineConfig::new())
            .expect("valid config");

        assert_eq!(fp.processor().token, None);
        assert_eq!(fp.processor().credential_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let result = FileProcessor::new(AlwaysOk::default(), PipelineConfig::new().with_threads(0));
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[tokio::test]
    async fn test_header_passthrough_and_rows() {
        let fp = FileProcessor::new(AlwaysOk::default(), PipelineConfig::new())
            .expect("valid config");
        let (mut success, mut failure) = sinks();

        let summary = fp
            .run("id,name\n1,x\n2,y\n3,z\n".as_bytes(), &mut success, &mut failure)
            .await
            .expect("run should succeed");

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 0);

        let mut ok = lines(success);
        assert_eq!(ok[0], "id,name");
        ok[1..].sort();
        assert_eq!(&ok[1..], &["1,x", "2,y", "3,z"]);
        assert_eq!(lines(failure), vec!["id,name"]);
    }

    #[tokio::test]
    async fn test_failure_header_gets_description_column() {
        let config = PipelineConfig::new().with_show_description(true);
        let fp = FileProcessor::new(AlwaysOk::default(), config).expect("valid config");
        let (mut success, mut failure) = sinks();

        fp.run("id,name\n1,x\n".as_bytes(), &mut success, &mut failure)
            .await
            .expect("run should succeed");

        assert_eq!(lines(success)[0], "id,name");
        assert_eq!(lines(failure), vec!["id,name,error_description"]);
    }

    #[tokio::test]
    async fn test_without_header_first_row_is_data() {
        let config = PipelineConfig::new().with_header(false).with_threads(1);
        let fp = FileProcessor::new(AlwaysOk::default(), config).expect("valid config");
        let (mut success, mut failure) = sinks();

        let summary = fp
            .run("1,x\n2,y\n".as_bytes(), &mut success, &mut failure)
            .await
            .expect("run should succeed");

        assert_eq!(summary.total, 2);
        assert_eq!(lines(success), vec!["1,x", "2,y"]);
        assert!(lines(failure).is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_with_header_is_error() {
        let fp = FileProcessor::new(AlwaysOk::default(), PipelineConfig::new())
            .expect("valid config");
        let (mut success, mut failure) = sinks();

        let err = fp
            .run("".as_bytes(), &mut success, &mut failure)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingHeader));
    }

    #[tokio::test]
    async fn test_validation_failure_is_fatal() {
        let fp = FileProcessor::new(Strict::default(), PipelineConfig::new().with_threads(2))
            .expect("valid config");
        let (mut success, mut failure) = sinks();

        let err = fp
            .run(
                "id,name\nA,1\nB,2\ninvalid,3\nC,4\n".as_bytes(),
                &mut success,
                &mut failure,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Validation { index: 2, .. }));
        let processed = fp.processor().processed.lock().expect("lock").clone();
        assert!(!processed.contains(&"C".to_string()));
        assert!(!processed.contains(&"invalid".to_string()));
    }

    #[tokio::test]
    async fn test_ragged_input_is_fatal() {
        let fp = FileProcessor::new(AlwaysOk::default(), PipelineConfig::new())
            .expect("valid config");
        let (mut success, mut failure) = sinks();

        let err = fp
            .run("id,name\n1,x\n2\n".as_bytes(), &mut success, &mut failure)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Read(_)));
    }

    /// A backend that rejects every write.
    struct DiskFull;

    impl Write for DiskFull {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    #[tokio::test]
    async fn test_failing_sink_still_returns_summary() {
        let fp = FileProcessor::new(AlwaysOk::default(), PipelineConfig::new().with_threads(2))
            .expect("valid config");

        let mut text = String::from("id,name\n");
        for id in 0..300 {
            text.push_str(&format!("{id},n\n"));
        }

        let mut success = RecordSink::new("success", DiskFull);
        let mut failure = RecordSink::new("failure", Vec::new());
        let summary = fp
            .run(std::io::Cursor::new(text.into_bytes()), &mut success, &mut failure)
            .await
            .expect("sink failures are not fatal");

        assert_eq!(summary.total, 300);
        assert_eq!(summary.succeeded, 300);
        assert_eq!(success.flushes(), 0);
    }
}
