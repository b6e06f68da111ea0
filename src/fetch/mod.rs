//! Flight status sources
//!
//! The tracker only depends on the [`FlightFetcher`] trait. Two sources
//! ship with the crate:
//! - [`SampleFetcher`]: a stand-in for the remote status service that
//!   answers every passenger with deterministic sample data
//! - [`FixtureFetcher`]: serves records loaded from a JSON fixture file

mod fixture;
mod sample;

pub use fixture::{FixtureEntry, FixtureFetcher};
pub use sample::SampleFetcher;

use crate::error::FetchResult;
use crate::flight::FlightStatus;

/// Source of flight status records
///
/// Implementations are shared by every fetch worker, so `fetch` must be
/// safe to call concurrently and keep no mutable state between calls.
#[async_trait::async_trait]
pub trait FlightFetcher: Send + Sync {
    /// Fetch the current status for one passenger
    async fn fetch(&self, passenger_name: &str) -> FetchResult<FlightStatus>;

    /// Short description of the source, for the run header
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

// Re-export async_trait for implementors
pub use async_trait::async_trait;
