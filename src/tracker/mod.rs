//! Top-level coordination of a tracking run

mod coordinator;

pub use coordinator::{FlightTracker, TrackReport};
