//! Watches one flight until it departs or is canceled

use crate::error::{WatchError, WatchResult};
use crate::flight::FlightStatus;
use crate::output::OutputSink;
use crate::watch::ticker::StatusTicker;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Result of a completed watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOutcome {
    pub passenger_name: String,

    /// Status lines emitted
    pub ticks: u64,

    /// Minutes to departure on the last emitted line, if any line was emitted
    pub last_remaining: Option<i32>,
}

/// Republishes a flight's status at a fixed interval
#[derive(Clone)]
pub struct FlightWatcher {
    interval: Duration,
    sink: Arc<dyn OutputSink>,
    cancel: CancellationToken,
}

impl FlightWatcher {
    pub fn new(interval: Duration, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            interval,
            sink,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop watching when this token is cancelled
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Emit one line per tick until the flight leaves, then a completion notice
    ///
    /// The record's phase is used as resolved by the source. Fails with
    /// `Interrupted` when cancelled; no completion notice is emitted then.
    pub async fn watch(&self, initial: FlightStatus) -> WatchResult<WatchOutcome> {
        let passenger_name = initial.passenger_name().to_string();
        info!(
            flight = %passenger_name,
            minutes = initial.departure_time_in_minutes(),
            phase = %initial.phase(),
            "Watching flight"
        );

        let mut ticker = StatusTicker::new(initial, self.interval);
        let mut last_remaining = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(flight = %passenger_name, "Watch interrupted");
                    return Err(WatchError::Interrupted {
                        flight: passenger_name,
                    });
                }
                next = ticker.next() => next,
            };

            let Some(status) = next else {
                break;
            };

            self.sink.emit(&describe(&status));
            last_remaining = Some(status.departure_time_in_minutes());
        }

        self.sink
            .emit(&format!("Finished tracking {}'s flight", passenger_name));
        debug!(flight = %passenger_name, ticks = ticker.ticks(), "Watch finished");

        Ok(WatchOutcome {
            passenger_name,
            ticks: ticker.ticks(),
            last_remaining,
        })
    }
}

/// Render the status line for a record
pub fn describe(status: &FlightStatus) -> String {
    format!(
        "{}: {} (Flight departs in {} minutes)",
        status.passenger_name(),
        status.phase().message(),
        status.departure_time_in_minutes()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::{BoardingState, FlightInfo, LoyaltyTier};
    use crate::output::MemorySink;

    fn status(name: &str, minutes: i32, flight_status: &str) -> FlightStatus {
        let flight = FlightInfo {
            flight_number: "UA901".into(),
            origin_airport: "DEN".into(),
            destination_airport: "BOS".into(),
            status: flight_status.into(),
        };
        FlightStatus::new(name, flight, LoyaltyTier::Silver, minutes)
    }

    fn watcher(sink: &Arc<MemorySink>) -> FlightWatcher {
        FlightWatcher::new(Duration::from_secs(1), Arc::clone(sink) as Arc<dyn OutputSink>)
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_counts_down() {
        let sink = Arc::new(MemorySink::new());
        let outcome = watcher(&sink).watch(status("A", 2, "OnTime")).await.unwrap();

        assert_eq!(
            sink.lines(),
            vec![
                "A: The boarding doors have closed (Flight departs in 2 minutes)",
                "A: The boarding doors have closed (Flight departs in 1 minutes)",
                "A: The boarding doors have closed (Flight departs in 0 minutes)",
                "Finished tracking A's flight",
            ]
        );
        assert_eq!(outcome.ticks, 3);
        assert_eq!(outcome.last_remaining, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_canceled_flight() {
        let sink = Arc::new(MemorySink::new());
        let outcome = watcher(&sink).watch(status("B", 5, "Canceled")).await.unwrap();

        assert_eq!(sink.lines(), vec!["Finished tracking B's flight"]);
        assert_eq!(outcome.ticks, 0);
        assert_eq!(outcome.last_remaining, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_changes_across_ticks() {
        let sink = Arc::new(MemorySink::new());
        watcher(&sink).watch(status("C", 26, "OnTime")).await.unwrap();

        let lines = sink.lines_starting_with("C:");
        assert_eq!(lines.len(), 27);
        assert_eq!(
            lines[0],
            "C: Other passengers are boarding (Flight departs in 26 minutes)"
        );
        assert_eq!(
            lines[1],
            "C: You can now board the plane (Flight departs in 25 minutes)"
        );
        assert_eq!(
            lines[26],
            "C: The boarding doors have closed (Flight departs in 0 minutes)"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reported_phase_used_as_given() {
        let sink = Arc::new(MemorySink::new());
        let initial = status("A", 2, "OnTime").with_reported_phase(BoardingState::WaitingToBoard);

        let outcome = watcher(&sink).watch(initial).await.unwrap();

        assert_eq!(
            sink.lines(),
            vec![
                "A: Other passengers are boarding (Flight departs in 2 minutes)",
                "A: Other passengers are boarding (Flight departs in 1 minutes)",
                "A: Other passengers are boarding (Flight departs in 0 minutes)",
                "Finished tracking A's flight",
            ]
        );
        assert_eq!(outcome.ticks, 3);
        assert_eq!(outcome.last_remaining, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_interrupted() {
        let sink = Arc::new(MemorySink::new());
        let cancel = CancellationToken::new();
        let watcher = watcher(&sink).with_cancellation(cancel.clone());

        let handle = tokio::spawn(async move { watcher.watch(status("E", 30, "OnTime")).await });
        tokio::time::sleep(Duration::from_millis(2500)).await;
        cancel.cancel();

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err, WatchError::Interrupted { flight: "E".into() });
        assert_eq!(sink.lines().len(), 3);
    }

    #[test]
    fn test_describe_every_phase() {
        let cases = [
            (BoardingState::FlightCanceled, "Your flight was canceled"),
            (BoardingState::BoardingNotStarted, "Boarding will start soon"),
            (BoardingState::WaitingToBoard, "Other passengers are boarding"),
            (BoardingState::Boarding, "You can now board the plane"),
            (BoardingState::BoardingEnded, "The boarding doors have closed"),
        ];
        for (phase, message) in cases {
            let record = status("F", 7, "OnTime").with_reported_phase(phase);
            assert_eq!(
                describe(&record),
                format!("F: {} (Flight departs in 7 minutes)", message)
            );
        }
    }

    #[test]
    fn test_describe() {
        let line = describe(&status("Madrigal", 70, "Delayed"));
        assert_eq!(
            line,
            "Madrigal: Boarding will start soon (Flight departs in 70 minutes)"
        );
    }
}
