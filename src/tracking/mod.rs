//! Tracking counter shared by the watches and its single observer

mod counter;

pub use counter::{CounterObserver, TrackingCounter};
