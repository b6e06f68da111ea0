//! Fetch worker task
//!
//! Each worker:
//! - Pulls passenger names from the shared name queue
//! - Fetches the passenger's flight through the shared fetcher
//! - Pushes the record onto the result queue
//!
//! A worker stops when the name queue is closed and drained, when the run
//! is cancelled, or on the first fetch failure.

use crate::error::{Result, TrackerError};
use crate::fetch::FlightFetcher;
use crate::flight::FlightStatus;
use crate::pool::queue::{QueueReceiver, QueueSender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Statistics collected by the workers of one pool run
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Flights fetched successfully
    pub fetched: AtomicU64,

    /// Fetches that failed
    pub errors: AtomicU64,
}

impl WorkerStats {
    fn record_fetch(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// One fetch worker
pub struct Worker {
    id: usize,
    fetcher: Arc<dyn FlightFetcher>,
    names: QueueReceiver<String>,
    results: QueueSender<FlightStatus>,
    cancel: CancellationToken,
    stats: Arc<WorkerStats>,
}

impl Worker {
    pub fn new(
        id: usize,
        fetcher: Arc<dyn FlightFetcher>,
        names: QueueReceiver<String>,
        results: QueueSender<FlightStatus>,
        cancel: CancellationToken,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            fetcher,
            names,
            results,
            cancel,
            stats,
        }
    }

    /// Drain the name queue, returning how many flights this worker fetched
    pub async fn run(self) -> Result<u64> {
        debug!(worker = self.id, "Worker starting");
        let mut fetched = 0u64;

        loop {
            let name = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(worker = self.id, "Worker cancelled");
                    break;
                }
                name = self.names.recv() => match name {
                    Some(name) => name,
                    None => break,
                },
            };

            let status = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(worker = self.id, flight = %name, "Fetch abandoned");
                    break;
                }
                status = self.fetcher.fetch(&name) => status,
            };

            match status {
                Ok(status) => {
                    debug!(worker = self.id, "Fetched flight: {}", status);
                    self.results.send(status)?;
                    self.stats.record_fetch();
                    fetched += 1;
                }
                Err(e) => {
                    self.stats.record_error();
                    warn!(
                        worker = self.id,
                        flight = %name,
                        recoverable = e.is_recoverable(),
                        error = %e,
                        "Fetch failed"
                    );
                    return Err(TrackerError::Fetch(e));
                }
            }
        }

        self.results.close();
        info!(worker = self.id, fetched = fetched, "Worker finished");
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::SampleFetcher;
    use crate::pool::queue::closable_queue;
    use std::time::Duration;

    #[test]
    fn test_worker_stats() {
        let stats = WorkerStats::default();

        stats.record_fetch();
        stats.record_fetch();
        stats.record_error();

        assert_eq!(stats.fetched.load(Ordering::Relaxed), 2);
        assert_eq!(stats.errors.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_worker_drains_queue() {
        let (name_tx, name_rx) = closable_queue::<String>("names");
        let (result_tx, result_rx) = closable_queue::<FlightStatus>("results");
        for name in ["Madrigal", "Estragon", "Taernyl"] {
            name_tx.send(name.to_string()).unwrap();
        }
        name_tx.close();

        let stats = Arc::new(WorkerStats::default());
        let worker = Worker::new(
            0,
            Arc::new(SampleFetcher::new(Duration::ZERO)),
            name_rx,
            result_tx,
            CancellationToken::new(),
            Arc::clone(&stats),
        );

        assert_eq!(worker.run().await.unwrap(), 3);

        let mut names = Vec::new();
        while let Some(status) = result_rx.recv().await {
            names.push(status.passenger_name().to_string());
        }
        assert_eq!(names, vec!["Madrigal", "Estragon", "Taernyl"]);
        assert_eq!(stats.fetched.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_worker_stops_on_fetch_failure() {
        let (name_tx, name_rx) = closable_queue::<String>("names");
        let (result_tx, _result_rx) = closable_queue::<FlightStatus>("results");
        name_tx.send("Polarcubis".into()).unwrap();
        name_tx.send("Madrigal".into()).unwrap();
        name_tx.close();

        let fetcher = SampleFetcher::new(Duration::ZERO).unavailable_for("Polarcubis");
        let worker = Worker::new(
            1,
            Arc::new(fetcher),
            name_rx.clone(),
            result_tx,
            CancellationToken::new(),
            Arc::new(WorkerStats::default()),
        );

        let err = worker.run().await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Fetch(FetchError::Unavailable { .. })
        ));
        // the second name is left for nobody; the pool discards it
        assert_eq!(name_rx.recv().await.as_deref(), Some("Madrigal"));
    }

    #[tokio::test]
    async fn test_worker_cancelled_before_start() {
        let (_name_tx, name_rx) = closable_queue::<String>("names");
        let (result_tx, _result_rx) = closable_queue::<FlightStatus>("results");

        let cancel = CancellationToken::new();
        cancel.cancel();

        let worker = Worker::new(
            2,
            Arc::new(SampleFetcher::new(Duration::ZERO)),
            name_rx,
            result_tx,
            cancel,
            Arc::new(WorkerStats::default()),
        );

        // queue is still open, only cancellation lets the worker return
        assert_eq!(worker.run().await.unwrap(), 0);
    }
}
