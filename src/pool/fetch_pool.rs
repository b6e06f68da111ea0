//! Fan-out/fan-in fetch pool
//!
//! ```text
//!   names ──► producer ──► [name queue] ──► worker 0..N ──► [result queue] ──► collector
//!                                              │
//!                                          supervisor (joins workers, closes results)
//! ```
//!
//! The producer enqueues every name and closes the name queue. Workers
//! drain it concurrently. The supervisor waits for every worker and then
//! closes the result queue, which is what ends the collector's loop; the
//! collector never relies on knowing how many records to expect.
//!
//! The first fetch failure cancels the producer and the remaining workers,
//! and the whole run fails without partial results.

use crate::config::MAX_WORKERS;
use crate::error::{ConfigError, Result, TrackerError, WorkerError};
use crate::fetch::FlightFetcher;
use crate::flight::FlightStatus;
use crate::pool::queue::closable_queue;
use crate::pool::worker::{Worker, WorkerStats};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Called with (fetched, total) as records arrive
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Worker-bounded pipeline that fetches one record per passenger
pub struct FetchPool {
    fetcher: Arc<dyn FlightFetcher>,
    worker_count: usize,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl FetchPool {
    /// Create a pool with the given number of workers
    pub fn new(fetcher: Arc<dyn FlightFetcher>, worker_count: usize) -> Result<Self> {
        if worker_count == 0 || worker_count > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: worker_count,
                max: MAX_WORKERS,
            }
            .into());
        }

        Ok(Self {
            fetcher,
            worker_count,
            cancel: CancellationToken::new(),
            progress: None,
        })
    }

    /// Stop the pool when this token is cancelled
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report progress as records arrive
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Fetch one record for every name
    ///
    /// Records come back in completion order. With a single worker that is
    /// the input order.
    #[instrument(skip(self, names), fields(flights = names.len(), workers = self.worker_count))]
    pub async fn fetch_all(&self, names: Vec<String>) -> Result<Vec<FlightStatus>> {
        let start = Instant::now();
        let total = names.len();

        // Child token so a failed run does not cancel the caller's token,
        // and so dropping this future stops every task it spawned.
        let run_token = self.cancel.child_token();
        let _cancel_on_drop = run_token.clone().drop_guard();

        let (name_tx, name_rx) = closable_queue::<String>("names");
        let (result_tx, result_rx) = closable_queue::<FlightStatus>("results");

        let producer_token = run_token.clone();
        let producer = tokio::spawn(async move {
            for name in names {
                if producer_token.is_cancelled() {
                    debug!("Producer cancelled");
                    return Ok(());
                }
                name_tx.send(name)?;
            }
            name_tx.close();
            Ok::<(), TrackerError>(())
        });

        let stats = Arc::new(WorkerStats::default());
        let mut workers = JoinSet::new();
        for id in 0..self.worker_count {
            let worker = Worker::new(
                id,
                Arc::clone(&self.fetcher),
                name_rx.clone(),
                result_tx.clone(),
                run_token.clone(),
                Arc::clone(&stats),
            );
            workers.spawn(worker.run());
        }
        drop(name_rx);

        let supervisor_token = run_token.clone();
        let supervisor = tokio::spawn(async move {
            let mut outcome: Result<()> = Ok(());

            while let Some(joined) = workers.join_next().await {
                let result = match joined {
                    Ok(result) => result.map(|_| ()),
                    Err(e) if e.is_cancelled() => Ok(()),
                    Err(e) => Err(panicked(e).into()),
                };

                if let Err(e) = result {
                    if outcome.is_ok() {
                        warn!(error = %e, "Stopping fetch pool");
                        supervisor_token.cancel();
                        workers.abort_all();
                        outcome = Err(e);
                    }
                }
            }

            result_tx.close();
            outcome
        });

        let mut flights = Vec::new();
        self.report_progress(0, total);
        while let Some(status) = result_rx.recv().await {
            flights.push(status);
            self.report_progress(flights.len(), total);
        }

        let supervised = supervisor.await.map_err(panicked)?;
        let produced = producer.await.map_err(panicked)?;

        if self.cancel.is_cancelled() {
            return Err(TrackerError::Interrupted);
        }
        supervised?;
        produced?;

        if flights.len() != total {
            return Err(WorkerError::MissingResults {
                expected: total,
                received: flights.len(),
            }
            .into());
        }

        info!(
            fetched = stats.fetched.load(Ordering::Relaxed),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetch pool finished"
        );

        Ok(flights)
    }

    fn report_progress(&self, fetched: usize, total: usize) {
        if let Some(progress) = &self.progress {
            progress(fetched, total);
        }
    }
}

fn panicked(e: JoinError) -> WorkerError {
    WorkerError::Panicked {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::SampleFetcher;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::time::Duration;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Arc<dyn FlightFetcher> {
        Arc::new(SampleFetcher::new(Duration::ZERO))
    }

    #[test]
    fn test_worker_count_validated() {
        assert!(FetchPool::new(sample(), 0).is_err());
        assert!(FetchPool::new(sample(), MAX_WORKERS + 1).is_err());
        assert!(FetchPool::new(sample(), MAX_WORKERS).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_one_record_per_name() {
        let input: Vec<String> = (0..25).map(|i| format!("Passenger{i}")).collect();

        for workers in [1, 2, 3, 8, 40] {
            let pool = FetchPool::new(sample(), workers).unwrap();
            let flights = pool.fetch_all(input.clone()).await.unwrap();

            assert_eq!(flights.len(), input.len());
            let seen: HashSet<&str> = flights.iter().map(|f| f.passenger_name()).collect();
            assert_eq!(seen.len(), input.len());
        }
    }

    #[tokio::test]
    async fn test_single_worker_keeps_order() {
        let input = names(&["Madrigal", "Polarcubis", "Estragon", "Taernyl"]);
        let pool = FetchPool::new(sample(), 1).unwrap();

        let flights = pool.fetch_all(input.clone()).await.unwrap();
        let output: Vec<String> = flights
            .iter()
            .map(|f| f.passenger_name().to_string())
            .collect();
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let pool = FetchPool::new(sample(), 2).unwrap();
        assert!(pool.fetch_all(Vec::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_aborts_pool() {
        let fetcher = SampleFetcher::new(Duration::ZERO).unavailable_for("Estragon");
        let pool = FetchPool::new(Arc::new(fetcher), 2).unwrap();

        let err = pool
            .fetch_all(names(&["Madrigal", "Estragon", "Taernyl"]))
            .await
            .unwrap_err();

        match err {
            TrackerError::Fetch(FetchError::Unavailable { name, .. }) => {
                assert_eq!(name, "Estragon")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failure_leaves_caller_token_alone() {
        let token = CancellationToken::new();
        let fetcher = SampleFetcher::new(Duration::ZERO).unavailable_for("A");
        let pool = FetchPool::new(Arc::new(fetcher), 1)
            .unwrap()
            .with_cancellation(token.clone());

        assert!(pool.fetch_all(names(&["A"])).await.is_err());
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_pool_is_interrupted() {
        let token = CancellationToken::new();
        token.cancel();

        let pool = FetchPool::new(sample(), 2)
            .unwrap()
            .with_cancellation(token);

        let err = pool.fetch_all(names(&["A", "B"])).await.unwrap_err();
        assert!(matches!(err, TrackerError::Interrupted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_fetch() {
        let token = CancellationToken::new();
        let fetcher = SampleFetcher::new(Duration::from_secs(60));
        let pool = FetchPool::new(Arc::new(fetcher), 2)
            .unwrap()
            .with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        });

        let err = pool.fetch_all(names(&["A", "B", "C"])).await.unwrap_err();
        assert!(matches!(err, TrackerError::Interrupted));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_progress_reported() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&calls);

        let pool = FetchPool::new(sample(), 2)
            .unwrap()
            .with_progress(Arc::new(move |fetched, total| {
                recorder.lock().push((fetched, total))
            }));
        pool.fetch_all(names(&["A", "B", "C"])).await.unwrap();

        let calls = calls.lock();
        assert_eq!(calls.first(), Some(&(0, 3)));
        assert_eq!(calls.last(), Some(&(3, 3)));
        assert_eq!(calls.len(), 4);
    }
}
