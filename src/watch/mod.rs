//! Per-flight status streams
//!
//! - `ticker`: the lazy countdown over one flight's status records
//! - `watcher`: turns ticks into output lines and a completion notice

mod ticker;
mod watcher;

pub use ticker::{should_stop, StatusTicker};
pub use watcher::{describe, FlightWatcher, WatchOutcome};
