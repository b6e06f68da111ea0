//! Error types for flight-watcher
//!
//! This module defines the error hierarchy for the tracker:
//! - Fetch errors raised by a `FlightFetcher` (fatal to the whole pool)
//! - Watch errors raised while replaying a flight's status ticks
//! - Counter errors from the shared tracking counter
//! - Configuration and worker errors
//!
//! Library code returns these typed errors; only the binary wraps them
//! in `anyhow` for display.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the flight tracker
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A flight could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A flight watch failed
    #[error("Watch error: {0}")]
    Watch(#[from] WatchError),

    /// Tracking counter misuse
    #[error("Counter error: {0}")]
    Counter(#[from] CounterError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Interrupted by signal
    #[error("Operation interrupted by signal")]
    Interrupted,
}

/// Errors produced while fetching a single flight
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No flight is known for this passenger
    #[error("No flight found for passenger '{name}'")]
    NotFound { name: String },

    /// The status service could not be reached
    #[error("Flight service unavailable for '{name}': {reason}")]
    Unavailable { name: String, reason: String },

    /// A response could not be parsed into a flight status
    #[error("Malformed response for '{name}': {reason}")]
    MalformedResponse { name: String, reason: String },

    /// A fixture file could not be loaded
    #[error("Cannot load fixtures from '{path}': {reason}")]
    Fixture { path: PathBuf, reason: String },
}

impl FetchError {
    /// Check if a retry could plausibly succeed
    ///
    /// The tracker never retries on its own; this only classifies the error
    /// for callers and log output.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FetchError::Unavailable { .. })
    }
}

/// Errors raised while watching a flight
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    /// A reported phase names none of the five boarding phases
    #[error("Invalid boarding phase for '{flight}': '{value}'")]
    InvalidPhase { flight: String, value: String },

    /// The watch was stopped before the flight left the gate
    #[error("Watch for '{flight}' was interrupted")]
    Interrupted { flight: String },
}

/// Tracking counter errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CounterError {
    /// More decrements than registered flights
    #[error("Tracking counter decremented below zero (registered {initial} flights)")]
    Underflow { initial: usize },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Tick interval must be positive
    #[error("Invalid tick interval {millis}ms: must be greater than zero")]
    InvalidInterval { millis: u64 },

    /// Empty passenger name
    #[error("Passenger names must not be empty")]
    EmptyPassengerName,

    /// Same passenger listed twice
    #[error("Passenger '{name}' is listed more than once")]
    DuplicatePassenger { name: String },

    /// Fixture path error
    #[error("Invalid fixture path '{path}': {reason}")]
    InvalidFixturePath { path: PathBuf, reason: String },
}

/// Worker task errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker task panicked
    #[error("Worker panicked: {message}")]
    Panicked { message: String },

    /// Queue send failed because every receiver is gone
    #[error("Failed to send to '{queue}' queue: queue closed")]
    QueueSendFailed { queue: &'static str },

    /// The pool finished without a record for every passenger
    #[error("Fetch pool returned {received} of {expected} flights")]
    MissingResults { expected: usize, received: usize },
}

/// Result type alias for TrackerError
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Result type alias for FetchError
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for WatchError
pub type WatchResult<T> = std::result::Result<T, WatchError>;
