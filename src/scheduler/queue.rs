//! Bounded queues connecting pipeline stages.
//!
//! Both queues are `tokio::sync::mpsc` channels of fixed capacity, so a full
//! queue suspends its producer. The input queue has many consumers; its
//! receiver is wrapped in a [`SharedReceiver`] that workers clone.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

/// Creates a bounded single-consumer queue.
pub fn bounded<T>(capacity: usize) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(capacity)
}

/// Creates a bounded queue whose receiving end can be shared by many workers.
pub fn bounded_shared<T>(capacity: usize) -> (mpsc::Sender<T>, SharedReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, SharedReceiver::new(rx))
}

/// Receiving end of a queue drained by several consumers.
///
/// The lock is held only while waiting for the next item, so one consumer's
/// processing never blocks the others from receiving.
pub struct SharedReceiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for SharedReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedReceiver<T> {
    fn new(rx: mpsc::Receiver<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rx)),
        }
    }

    /// Receives the next item.
    ///
    /// Returns `None` once every sender is dropped and the queue is drained.
    pub async fn recv(&self) -> Option<T> {
        let mut rx = self.inner.lock().await;
        rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shared_receiver_drains_then_closes() {
        let (tx, rx) = bounded_shared(4);
        let other = rx.clone();

        tx.send(1).await.expect("send");
        tx.send(2).await.expect("send");
        drop(tx);

        let mut seen = vec![
            rx.recv().await.expect("first"),
            other.recv().await.expect("second"),
        ];
        seen.sort();
        assert_eq!(seen, vec![1, 2]);
        assert!(rx.recv().await.is_none());
        assert!(other.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_bounded_queue_applies_backpressure() {
        let (tx, mut rx) = bounded(1);

        tx.send("a").await.expect("send");
        assert!(tx.try_send("b").is_err(), "second item should not fit");

        assert_eq!(rx.recv().await, Some("a"));
        assert!(tx.try_send("b").is_ok());
    }
}
