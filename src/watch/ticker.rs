//! Periodic status stream for one flight
//!
//! `StatusTicker` is a small state machine over the current record:
//! the first call to [`StatusTicker::next`] yields the initial record, every
//! later call waits one interval and advances the record by a minute. The
//! stop predicate runs before anything is yielded, so a canceled record
//! yields nothing and the last record yielded for a flight that departs is
//! the one at zero minutes.
//!
//! Once `next` returns `None` the ticker stays finished. Dropping a pending
//! `next` future also finishes it.

use crate::flight::FlightStatus;
use std::time::Duration;
use tracing::trace;

/// True when a record must not be emitted and the stream ends
pub fn should_stop(status: &FlightStatus) -> bool {
    status.departure_time_in_minutes() < 0 || status.is_canceled()
}

/// Lazy, time-decreasing sequence of status records
#[derive(Debug)]
pub struct StatusTicker {
    current: Option<FlightStatus>,
    interval: Duration,
    started: bool,
    ticks: u64,
}

impl StatusTicker {
    pub fn new(initial: FlightStatus, interval: Duration) -> Self {
        Self {
            current: Some(initial),
            interval,
            started: false,
            ticks: 0,
        }
    }

    /// Next record, or `None` once the flight has left or was canceled
    pub async fn next(&mut self) -> Option<FlightStatus> {
        let current = self.current.take()?;

        let candidate = if self.started {
            tokio::time::sleep(self.interval).await;
            current.advance()
        } else {
            self.started = true;
            current
        };

        if should_stop(&candidate) {
            trace!(
                flight = %candidate.passenger_name(),
                minutes = candidate.departure_time_in_minutes(),
                "Ticker finished"
            );
            return None;
        }

        self.ticks += 1;
        self.current = Some(candidate.clone());
        Some(candidate)
    }

    /// Records yielded so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none()
    }
}
