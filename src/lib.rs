//! flight-watcher - Passenger flight tracker
//!
//! Fetches the current flight of every tracked passenger, then follows each
//! flight minute by minute until it departs or is canceled.
//!
//! # Features
//!
//! - **Bounded Fetch Pool**: A fixed number of workers drain a closable
//!   queue of passenger names; the first failure stops the whole pool.
//!
//! - **Periodic Status Streams**: Each flight is replayed as a lazy
//!   countdown that announces its boarding phase once per interval.
//!
//! - **Observable Tracking Counter**: A shared counter of flights still
//!   being watched, with an observer that ends once it reaches zero.
//!
//! - **Pluggable Sources**: A deterministic sample service or a JSON
//!   fixture file, behind the `FlightFetcher` trait.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Passenger names                        │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ producer
//!                                ▼
//!                    ┌───────────────────────┐
//!                    │      Name queue       │
//!                    └───────────┬───────────┘
//!          ┌─────────────────────┼─────────────────────┐
//!          ▼                     ▼                     ▼
//!    ┌──────────┐          ┌──────────┐          ┌──────────┐
//!    │ Worker 1 │          │ Worker 2 │   ...    │ Worker N │
//!    └────┬─────┘          └────┬─────┘          └────┬─────┘
//!         └─────────────────────┼─────────────────────┘
//!                               ▼
//!                    ┌───────────────────────┐
//!                    │     Result queue      │ ◄── closed by supervisor
//!                    └───────────┬───────────┘
//!                                ▼
//!            ┌────────────────────────────────────────┐
//!            │  FlightWatcher per record (ticks)      │──► output sink
//!            │  TrackingCounter ── observer           │──► output sink
//!            └────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Track the sample passengers
//! flight-watcher
//!
//! # Four workers, fast ticks, all flights at once
//! flight-watcher Madrigal Estragon -w 4 --interval-ms 100 --concurrent
//!
//! # Offline, from a fixture file
//! flight-watcher --fixtures flights.json
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod flight;
pub mod output;
pub mod pool;
pub mod progress;
pub mod tracker;
pub mod tracking;
pub mod watch;

pub use config::{CliArgs, TrackerConfig, WatchMode};
pub use error::{Result, TrackerError};
pub use fetch::{FixtureFetcher, FlightFetcher, SampleFetcher};
pub use flight::{BoardingState, FlightInfo, FlightStatus, LoyaltyTier};
pub use output::{ConsoleSink, MemorySink, OutputSink};
pub use pool::FetchPool;
pub use tracker::{FlightTracker, TrackReport};
pub use tracking::TrackingCounter;
pub use watch::{FlightWatcher, StatusTicker};
