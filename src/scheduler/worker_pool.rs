//! Worker pool processing admitted records.
//!
//! Each worker is an independent tokio task that pulls one [`Input`] at a
//! time from the shared input queue, awaits the processor, and pushes the
//! resulting [`RecordResult`] onto the output queue. A coordinator task owns
//! the workers and the original output sender: it drops that sender only
//! after every worker has finished, so the output queue closes exactly once
//! and never while a result is still in flight.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::error::PipelineError;
use crate::pipeline::processor::RecordProcessor;
use crate::pipeline::record::{Input, RecordResult};

use super::queue::SharedReceiver;

/// A running pool of workers.
pub struct WorkerPool {
    num_workers: usize,
    coordinator: JoinHandle<Result<(), PipelineError>>,
}

impl WorkerPool {
    /// Spawns `num_workers` workers and their coordinator.
    ///
    /// Workers run until `inputs` is closed and drained. `results` is closed
    /// once the last of them exits.
    pub fn start<P>(
        num_workers: usize,
        processor: Arc<P>,
        inputs: SharedReceiver<Input>,
        results: mpsc::Sender<RecordResult>,
    ) -> Self
    where
        P: RecordProcessor + 'static,
    {
        let mut workers = JoinSet::new();
        for i in 0..num_workers {
            let worker = Worker::new(
                i + 1,
                Arc::clone(&processor),
                inputs.clone(),
                results.clone(),
            );
            workers.spawn(worker.run());
        }

        info!(num_workers = num_workers, "Worker pool started");

        let coordinator = tokio::spawn(coordinate(workers, results));

        Self {
            num_workers,
            coordinator,
        }
    }

    /// Returns the number of workers in the pool.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Waits for every worker to finish.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::WorkerPanicked` if any worker panicked.
    pub async fn join(self) -> Result<(), PipelineError> {
        match self.coordinator.await {
            Ok(result) => result,
            Err(e) => Err(PipelineError::WorkerPanicked(e.to_string())),
        }
    }

    /// Stops all workers without waiting for queued records.
    pub fn abort(&self) {
        // Dropping the coordinator's JoinSet aborts every worker.
        self.coordinator.abort();
    }
}

/// Joins every worker, then closes the output queue.
async fn coordinate(
    mut workers: JoinSet<()>,
    results: mpsc::Sender<RecordResult>,
) -> Result<(), PipelineError> {
    let mut panicked = None;

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Worker task panicked");
            panicked.get_or_insert_with(|| e.to_string());
        }
    }

    drop(results);
    debug!("All workers finished, output queue closed");

    match panicked {
        Some(message) => Err(PipelineError::WorkerPanicked(message)),
        None => Ok(()),
    }
}

/// A single worker draining the input queue.
struct Worker<P> {
    id: usize,
    processor: Arc<P>,
    inputs: SharedReceiver<Input>,
    results: mpsc::Sender<RecordResult>,
}

impl<P: RecordProcessor> Worker<P> {
    fn new(
        id: usize,
        processor: Arc<P>,
        inputs: SharedReceiver<Input>,
        results: mpsc::Sender<RecordResult>,
    ) -> Self {
        Self {
            id,
            processor,
            inputs,
            results,
        }
    }

    /// Main worker loop.
    async fn run(self) {
        debug!(worker_id = self.id, "Worker started");

        while let Some(input) = self.inputs.recv().await {
            let output = self.processor.process(&input).await;

            if self
                .results
                .send(RecordResult::new(input, output))
                .await
                .is_err()
            {
                debug!(worker_id = self.id, "Output queue closed, stopping early");
                break;
            }
        }

        debug!(worker_id = self.id, "Worker stopped");
    }
}
