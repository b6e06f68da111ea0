//! Closable FIFO queue shared by the fetch pool's tasks
//!
//! A queue has cloneable sender and receiver handles. Closing is done by
//! the owner of a sender calling [`QueueSender::close`]; once every sender
//! is closed or dropped no more items can be enqueued, but items already
//! queued stay receivable until the queue is drained. Receivers then see
//! `None`.
//!
//! Several workers may receive from the same queue: each item is handed
//! to exactly one of them.
//!
//! Queues are unbounded, so `send` never waits. Memory use grows with the
//! number of pending items, which is bounded here by the passenger list.

use crate::error::WorkerError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::trace;

/// Statistics for a queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total items enqueued
    pub enqueued: AtomicU64,

    /// Total items dequeued
    pub dequeued: AtomicU64,
}

impl QueueStats {
    /// Items enqueued but not yet received
    pub fn pending(&self) -> u64 {
        self.enqueued
            .load(Ordering::Relaxed)
            .saturating_sub(self.dequeued.load(Ordering::Relaxed))
    }

    /// Items received so far
    pub fn throughput(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }
}

/// Create a closable queue, returning its first sender and receiver
pub fn closable_queue<T>(name: &'static str) -> (QueueSender<T>, QueueReceiver<T>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let stats = Arc::new(QueueStats::default());

    (
        QueueSender {
            name,
            sender,
            stats: Arc::clone(&stats),
        },
        QueueReceiver {
            name,
            receiver: Arc::new(Mutex::new(receiver)),
            stats,
        },
    )
}

/// Handle for sending items to the queue
pub struct QueueSender<T> {
    name: &'static str,
    sender: mpsc::UnboundedSender<T>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            sender: self.sender.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> QueueSender<T> {
    /// Enqueue an item
    ///
    /// Fails only when every receiver has been dropped.
    pub fn send(&self, item: T) -> Result<(), WorkerError> {
        self.sender
            .send(item)
            .map_err(|_| WorkerError::QueueSendFailed { queue: self.name })?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Close this handle
    ///
    /// The queue is closed for good once every sender has been closed or
    /// dropped.
    pub fn close(self) {
        trace!(queue = self.name, "Queue sender closed");
    }

    /// Queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// Handle for receiving items from the queue
pub struct QueueReceiver<T> {
    name: &'static str,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<T>>>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            receiver: Arc::clone(&self.receiver),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> QueueReceiver<T> {
    /// Receive the next item
    ///
    /// Waits while the queue is empty and still open. Returns `None` once
    /// the queue is closed and drained.
    pub async fn recv(&self) -> Option<T> {
        let item = self.receiver.lock().await.recv().await?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    /// Try to receive an item without waiting
    pub fn try_recv(&self) -> Option<T> {
        let mut receiver = self.receiver.try_lock().ok()?;
        let item = receiver.try_recv().ok()?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    /// Queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_basic() {
        let (sender, receiver) = closable_queue::<String>("names");

        sender.send("Madrigal".into()).unwrap();
        assert_eq!(sender.stats().pending(), 1);

        let name = receiver.recv().await.unwrap();
        assert_eq!(name, "Madrigal");
        assert_eq!(receiver.stats().pending(), 0);
    }

    #[tokio::test]
    async fn test_close_keeps_queued_items() {
        let (sender, receiver) = closable_queue::<u32>("numbers");

        sender.send(1).unwrap();
        sender.send(2).unwrap();
        sender.close();

        // queued items survive the close, in FIFO order
        assert_eq!(receiver.recv().await, Some(1));
        assert_eq!(receiver.recv().await, Some(2));
        assert_eq!(receiver.recv().await, None);
        assert_eq!(receiver.recv().await, None);
    }

    #[tokio::test]
    async fn test_queue_open_until_last_sender_closes() {
        let (sender, receiver) = closable_queue::<u32>("results");
        let second = sender.clone();

        sender.close();
        second.send(7).unwrap();
        assert_eq!(receiver.recv().await, Some(7));
        assert!(receiver.try_recv().is_none());

        second.close();
        assert_eq!(receiver.recv().await, None);
    }

    #[tokio::test]
    async fn test_send_after_receivers_dropped() {
        let (sender, receiver) = closable_queue::<u32>("orphan");
        drop(receiver);

        let err = sender.send(1).unwrap_err();
        assert!(matches!(err, WorkerError::QueueSendFailed { queue: "orphan" }));
    }

    #[tokio::test]
    async fn test_items_split_between_receivers() {
        let (sender, receiver) = closable_queue::<u32>("shared");
        let other = receiver.clone();

        for n in 0..10 {
            sender.send(n).unwrap();
        }
        sender.close();

        let first = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(n) = receiver.recv().await {
                seen.push(n);
            }
            seen
        });
        let second = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(n) = other.recv().await {
                seen.push(n);
            }
            seen
        });

        let mut all = first.await.unwrap();
        all.extend(second.await.unwrap());
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_queue_stats() {
        let (sender, receiver) = closable_queue::<&str>("stats");

        sender.send("a").unwrap();
        sender.send("b").unwrap();
        receiver.recv().await.unwrap();
        receiver.recv().await.unwrap();

        let stats = receiver.stats();
        assert_eq!(stats.enqueued.load(Ordering::Relaxed), 2);
        assert_eq!(stats.dequeued.load(Ordering::Relaxed), 2);
        assert_eq!(stats.throughput(), 2);
    }
}
