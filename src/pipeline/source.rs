//! Row source: reads, validates and admits input records.

use std::io::Read;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::PipelineError;

use super::processor::RecordProcessor;
use super::record::Input;

/// Reads raw records from a CSV stream.
///
/// Every record must have the same number of fields as the first one; a
/// ragged or badly encoded record is a read error.
pub struct RowSource<R: Read> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
    next_index: u64,
}

impl<R: Read> RowSource<R> {
    /// Creates a source reading from `input`.
    pub fn new(input: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false) // the header is handled by read_header
            .from_reader(input);

        Self {
            reader,
            record: csv::StringRecord::new(),
            next_index: 0,
        }
    }

    /// Reads the header record.
    ///
    /// Must be called before any data record is read.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingHeader` on an empty stream and
    /// `PipelineError::Read` if the record cannot be decoded.
    pub fn read_header(&mut self) -> Result<Vec<String>, PipelineError> {
        self.read_raw()?.ok_or(PipelineError::MissingHeader)
    }

    /// Reads the next data record without validating it.
    ///
    /// Returns `Ok(None)` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<Input>, PipelineError> {
        let Some(line) = self.read_raw()? else {
            return Ok(None);
        };
        let input = Input::new(self.next_index, line);
        self.next_index += 1;
        Ok(Some(input))
    }

    /// Reads every remaining record, validates it and pushes it onto `inputs`.
    ///
    /// Blocks while the queue is full, so this must run on a blocking
    /// thread. `inputs` is dropped on return, which closes the queue. Returns
    /// the number of records admitted.
    ///
    /// # Errors
    ///
    /// Stops at the first read or validation error. Records after the
    /// offending one are never queued.
    pub fn feed<P>(mut self, processor: &P, inputs: mpsc::Sender<Input>) -> Result<u64, PipelineError>
    where
        P: RecordProcessor + ?Sized,
    {
        info!("Started reading records");
        let mut admitted = 0u64;

        while let Some(input) = self.next_record()? {
            if let Err(source) = processor.validate(&input.line) {
                return Err(PipelineError::Validation {
                    index: input.index,
                    record: input.line,
                    source,
                });
            }

            if inputs.blocking_send(input).is_err() {
                debug!(admitted = admitted, "Input queue closed, stopping reader");
                return Ok(admitted);
            }
            admitted += 1;
        }

        info!(admitted = admitted, "Finished reading records");
        Ok(admitted)
    }

    fn read_raw(&mut self) -> Result<Option<Vec<String>>, PipelineError> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        Ok(Some(self.record.iter().map(str::to_string).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::record::{Identifier, Output};
    use async_trait::async_trait;

    /// Rejects any record whose first field is not numeric.
    struct NumericId;

    #[async_trait]
    impl RecordProcessor for NumericId {
        fn validate(&self, record: &[String]) -> anyhow::Result<()> {
            record[0].parse::<u64>()?;
            Ok(())
        }

        fn identify(&self, input: &Input) -> Identifier {
            Identifier::new("row", input.index)
        }

        async fn process(&self, input: &Input) -> Output {
            Output::success(input.line.clone())
        }
    }

    #[test]
    fn test_header_then_records() {
        let mut source = RowSource::new("id,name\n1,x\n2,\"y, z\"\n".as_bytes());

        assert_eq!(source.read_header().expect("header"), vec!["id", "name"]);

        let first = source.next_record().expect("read").expect("record");
        assert_eq!(first.index, 0);
        assert_eq!(first.line, vec!["1", "x"]);

        let second = source.next_record().expect("read").expect("record");
        assert_eq!(second.index, 1);
        assert_eq!(second.line, vec!["2", "y, z"]);

        assert!(source.next_record().expect("read").is_none());
    }

    #[test]
    fn test_missing_header() {
        let mut source = RowSource::new("".as_bytes());
        assert!(matches!(
            source.read_header(),
            Err(PipelineError::MissingHeader)
        ));
    }

    #[test]
    fn test_ragged_record_is_read_error() {
        let mut source = RowSource::new("1,x\n2\n".as_bytes());
        source.next_record().expect("first record is fine");
        assert!(matches!(source.next_record(), Err(PipelineError::Read(_))));
    }

    #[test]
    fn test_feed_admits_valid_records() {
        let (tx, mut rx) = mpsc::channel(10);
        let source = RowSource::new("1,a\n2,b\n3,c\n".as_bytes());

        let admitted = source.feed(&NumericId, tx).expect("feed");
        assert_eq!(admitted, 3);

        let mut lines = Vec::new();
        while let Ok(input) = rx.try_recv() {
            lines.push(input.line[0].clone());
        }
        assert_eq!(lines, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_feed_stops_at_invalid_record() {
        let (tx, mut rx) = mpsc::channel(10);
        let source = RowSource::new("1,a\n2,b\nbad,c\n4,d\n".as_bytes());

        let err = source.feed(&NumericId, tx).unwrap_err();
        match err {
            PipelineError::Validation { index, record, .. } => {
                assert_eq!(index, 2);
                assert_eq!(record, vec!["bad", "c"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut lines = Vec::new();
        while let Ok(input) = rx.try_recv() {
            lines.push(input.line[0].clone());
        }
        assert_eq!(lines, vec!["1", "2"]);
    }

    #[test]
    fn test_feed_stops_when_queue_closed() {
        let (tx, rx) = mpsc::channel(10);
        drop(rx);
        let source = RowSource::new("1,a\n2,b\n".as_bytes());

        assert_eq!(source.feed(&NumericId, tx).expect("feed"), 0);
    }
}
