//! Shared count of flights still being watched
//!
//! The count lives in a `tokio::sync::watch` channel. Decrements go through
//! the sender's lock, so concurrent watches never lose an update, and
//! observers are woken on change instead of polling.
//!
//! An observer may skip intermediate values when several decrements land
//! before it wakes, but what it sees is always non-increasing and always
//! ends with 0.

use crate::error::CounterError;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

#[derive(Debug)]
struct Shared {
    initial: usize,
    tx: watch::Sender<usize>,
}

/// Cloneable handle to the tracking counter
#[derive(Debug, Clone)]
pub struct TrackingCounter {
    shared: Arc<Shared>,
}

impl TrackingCounter {
    /// Create a counter for `initial` tracked flights
    pub fn new(initial: usize) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared { initial, tx }),
        }
    }

    /// Record one finished watch, returning the new count
    ///
    /// Decrementing a counter that is already at zero is an error and
    /// leaves the count at zero.
    pub fn decrement(&self) -> Result<usize, CounterError> {
        let mut result = Err(CounterError::Underflow {
            initial: self.shared.initial,
        });

        self.shared.tx.send_if_modified(|value| {
            if *value == 0 {
                return false;
            }
            *value -= 1;
            result = Ok(*value);
            true
        });

        if let Ok(remaining) = result {
            trace!(remaining = remaining, "Tracking counter decremented");
        }
        result
    }

    /// Current count
    pub fn value(&self) -> usize {
        *self.shared.tx.borrow()
    }

    /// Count the counter was created with
    pub fn initial(&self) -> usize {
        self.shared.initial
    }

    /// Subscribe to the count
    pub fn observe(&self) -> CounterObserver {
        CounterObserver {
            rx: self.shared.tx.subscribe(),
            started: false,
            finished: false,
        }
    }
}

/// Independent subscription to a [`TrackingCounter`]
#[derive(Debug)]
pub struct CounterObserver {
    rx: watch::Receiver<usize>,
    started: bool,
    finished: bool,
}

impl CounterObserver {
    /// Current value on the first call, then the next changed value
    ///
    /// Returns `None` after 0 has been yielded, or when every counter handle
    /// has been dropped.
    pub async fn next(&mut self) -> Option<usize> {
        if self.finished {
            return None;
        }

        if self.started && self.rx.changed().await.is_err() {
            self.finished = true;
            return None;
        }
        self.started = true;

        let value = *self.rx.borrow_and_update();
        if value == 0 {
            self.finished = true;
        }
        Some(value)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
