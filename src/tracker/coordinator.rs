//! Flight tracker - orchestrates the fetch and watch phases
//!
//! The tracker is responsible for:
//! - Fetching every passenger's flight through the fetch pool
//! - Creating the tracking counter and running its observer
//! - Watching each flight, sequentially or concurrently
//! - Shutdown on Ctrl+C and the final report

use crate::config::{TrackerConfig, WatchMode};
use crate::error::{Result, TrackerError, WatchError, WorkerError};
use crate::fetch::FlightFetcher;
use crate::flight::FlightStatus;
use crate::output::OutputSink;
use crate::pool::{FetchPool, ProgressCallback};
use crate::tracking::{CounterObserver, TrackingCounter};
use crate::watch::{FlightWatcher, WatchOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a completed tracking run
#[derive(Debug, Clone)]
pub struct TrackReport {
    /// Flights fetched from the source
    pub flights_fetched: usize,

    /// Watches that ran to completion
    pub flights_tracked: usize,

    /// Status lines emitted across all watches
    pub ticks_emitted: u64,

    /// Values seen by the counter observer, in order
    pub observed_counts: Vec<usize>,

    /// Per-flight watch results, in completion order
    pub outcomes: Vec<WatchOutcome>,

    /// Time taken for the run
    pub duration: Duration,
}

/// Coordinates fetching and watching of all flights
pub struct FlightTracker {
    /// Configuration
    config: Arc<TrackerConfig>,

    /// Source of flight records
    fetcher: Arc<dyn FlightFetcher>,

    /// Where user-facing lines go
    sink: Arc<dyn OutputSink>,

    /// Cancelled on Ctrl+C
    shutdown: CancellationToken,

    /// Fetch progress callback
    progress: Option<ProgressCallback>,
}

impl FlightTracker {
    /// Create a new tracker
    pub fn new(
        config: TrackerConfig,
        fetcher: Arc<dyn FlightFetcher>,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            sink,
            shutdown: CancellationToken::new(),
            progress: None,
        })
    }

    /// Report fetch progress through this callback
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Get a clone of the shutdown token (for signal handlers)
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Fetch every flight, then watch them all
    pub async fn run(&self) -> Result<TrackReport> {
        let start = Instant::now();

        let flights = self.fetch().await?;
        let mut report = self.track(flights).await?;

        report.duration = start.elapsed();
        Ok(report)
    }

    /// Fetch phase: one record per configured passenger
    pub async fn fetch(&self) -> Result<Vec<FlightStatus>> {
        info!(
            passengers = self.config.passenger_names.len(),
            workers = self.config.worker_count,
            source = %self.fetcher.describe(),
            "Fetching flights"
        );
        self.sink.emit("Getting the latest flight info...");

        let mut pool = FetchPool::new(Arc::clone(&self.fetcher), self.config.worker_count)?
            .with_cancellation(self.shutdown.clone());
        if let Some(progress) = &self.progress {
            pool = pool.with_progress(Arc::clone(progress));
        }

        let flights = pool.fetch_all(self.config.passenger_names.clone()).await?;

        if flights.is_empty() {
            self.sink.emit("No flights found");
        } else {
            let found = flights
                .iter()
                .map(|flight| format!("{} ({})", flight.passenger_name(), flight.flight_number()))
                .collect::<Vec<_>>()
                .join(", ");
            self.sink.emit(&format!("Found flights for {}", found));
        }

        Ok(flights)
    }

    /// Watch phase: watch every record while the counter observer runs
    pub async fn track(&self, flights: Vec<FlightStatus>) -> Result<TrackReport> {
        let start = Instant::now();
        let flights_fetched = flights.len();

        info!(
            flights = flights_fetched,
            mode = ?self.config.watch_mode,
            interval_ms = self.config.tick_interval.as_millis() as u64,
            "Starting flight tracking"
        );

        let counter = TrackingCounter::new(flights_fetched);
        let mut observer = counter.observe();

        // The opening count is announced here so it precedes any watch output.
        let mut seen = Vec::new();
        if let Some(count) = observer.next().await {
            announce_count(self.sink.as_ref(), count);
            seen.push(count);
        }
        let observer_task = tokio::spawn(report_counts(seen, observer, Arc::clone(&self.sink)));

        let watcher = FlightWatcher::new(self.config.tick_interval, Arc::clone(&self.sink))
            .with_cancellation(self.shutdown.clone());

        let watched = match self.config.watch_mode {
            WatchMode::Sequential => watch_sequential(&watcher, flights, &counter).await,
            WatchMode::Concurrent => {
                watch_concurrent(&watcher, flights, &counter, &self.shutdown).await
            }
        };

        let outcomes = match watched {
            Ok(outcomes) => outcomes,
            Err(e) => {
                observer_task.abort();
                if self.shutdown.is_cancelled() {
                    warn!("Tracking interrupted");
                    return Err(TrackerError::Interrupted);
                }
                return Err(e);
            }
        };

        // every watch decremented once, so the observer has reached zero
        let observed_counts = observer_task.await.map_err(panicked)?;

        let report = TrackReport {
            flights_fetched,
            flights_tracked: outcomes.len(),
            ticks_emitted: outcomes.iter().map(|outcome| outcome.ticks).sum(),
            observed_counts,
            outcomes,
            duration: start.elapsed(),
        };

        info!(
            flights = report.flights_tracked,
            ticks = report.ticks_emitted,
            duration_ms = report.duration.as_millis() as u64,
            "Tracking completed"
        );

        Ok(report)
    }
}

async fn watch_sequential(
    watcher: &FlightWatcher,
    flights: Vec<FlightStatus>,
    counter: &TrackingCounter,
) -> Result<Vec<WatchOutcome>> {
    let mut outcomes = Vec::with_capacity(flights.len());

    for flight in flights {
        let outcome = watcher.watch(flight).await?;
        counter.decrement()?;
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

async fn watch_concurrent(
    watcher: &FlightWatcher,
    flights: Vec<FlightStatus>,
    counter: &TrackingCounter,
    shutdown: &CancellationToken,
) -> Result<Vec<WatchOutcome>> {
    // a failed watch stops its siblings without touching the caller's token
    let stop = shutdown.child_token();
    let _stop_on_drop = stop.clone().drop_guard();

    let mut watches = JoinSet::new();
    for flight in flights {
        let watcher = watcher.clone().with_cancellation(stop.clone());
        let counter = counter.clone();
        watches.spawn(async move {
            let outcome = watcher.watch(flight).await?;
            counter.decrement()?;
            Ok::<_, TrackerError>(outcome)
        });
    }

    let mut outcomes = Vec::new();
    let mut failure: Option<TrackerError> = None;

    while let Some(joined) = watches.join_next().await {
        let result = match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => continue,
            Err(e) => Err(panicked(e).into()),
        };

        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(TrackerError::Watch(WatchError::Interrupted { flight })) if failure.is_some() => {
                debug!(flight = %flight, "Watch stopped after sibling failure");
            }
            Err(e) => {
                if failure.is_none() {
                    warn!(error = %e, "Watch failed, stopping remaining watches");
                    stop.cancel();
                    failure = Some(e);
                }
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(outcomes),
    }
}

/// Print the tracked-flight count until it reaches zero
async fn report_counts(
    mut seen: Vec<usize>,
    mut observer: CounterObserver,
    sink: Arc<dyn OutputSink>,
) -> Vec<usize> {
    while let Some(count) = observer.next().await {
        announce_count(sink.as_ref(), count);
        seen.push(count);
    }
    seen
}

fn announce_count(sink: &dyn OutputSink, count: usize) {
    if count > 0 {
        sink.emit(&format!("There are {} flights being tracked", count));
    } else {
        sink.emit("Finished tracking all flights");
    }
}

fn panicked(e: JoinError) -> WorkerError {
    WorkerError::Panicked {
        message: e.to_string(),
    }
}
