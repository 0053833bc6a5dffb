//! Concurrent execution for pipeline runs: bounded queues and the worker pool.
//!
//! ```text
//!                 ┌──────────────┐
//!                 │  Row source  │
//!                 └──────┬───────┘
//!                        │ input queue (bounded)
//!        ┌───────────────┼───────────────┐
//!        ▼               ▼               ▼
//!   ┌─────────┐     ┌─────────┐     ┌─────────┐
//!   │ Worker 1│     │ Worker 2│     │ Worker N│
//!   └────┬────┘     └────┬────┘     └────┬────┘
//!        └───────────────┼───────────────┘
//!                        │ output queue (bounded)
//!                 ┌──────▼───────┐
//!                 │  Aggregator  │
//!                 └──────────────┘
//! ```
//!
//! Both queues block their producers when full. The output queue is closed
//! by the pool's coordinator once every worker has exited.

pub mod queue;
pub mod worker_pool;

pub use queue::{bounded, bounded_shared, SharedReceiver};
pub use worker_pool::WorkerPool;
