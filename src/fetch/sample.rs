//! Sample status service
//!
//! Stands in for the remote flight and loyalty endpoints. Both lookups run
//! concurrently, then the responses are combined after a short delay and
//! parsed like a real response would be. Data is derived from the
//! passenger name, so the same passenger always gets the same flight.

use super::FlightFetcher;
use crate::error::{FetchError, FetchResult};
use crate::flight::{FlightStatus, LoyaltyTier};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

const CARRIERS: [&str; 6] = ["AK", "BN", "CX", "DL", "UA", "WN"];
const AIRPORTS: [&str; 8] = ["MSP", "ATL", "ORD", "LAX", "SEA", "JFK", "DEN", "BOS"];

/// Simulated flight status service
#[derive(Debug, Clone)]
pub struct SampleFetcher {
    /// Delay of each individual lookup
    lookup_delay: Duration,

    /// Delay before the two responses are combined
    combine_delay: Duration,

    /// Passengers whose lookups fail
    unavailable: HashSet<String>,
}

impl SampleFetcher {
    /// Create a sample fetcher with the given combine delay
    pub fn new(combine_delay: Duration) -> Self {
        Self {
            lookup_delay: Duration::ZERO,
            combine_delay,
            unavailable: HashSet::new(),
        }
    }

    /// Set the delay of each flight and loyalty lookup
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = delay;
        self
    }

    /// Make lookups for this passenger fail as if the service were down
    pub fn unavailable_for(mut self, passenger_name: impl Into<String>) -> Self {
        self.unavailable.insert(passenger_name.into());
        self
    }

    async fn lookup_flight(&self, passenger_name: &str) -> FetchResult<String> {
        debug!(passenger = %passenger_name, "Starting fetching flight info");
        self.wait_for_service(passenger_name).await?;

        let mut rng = StdRng::seed_from_u64(seed_for(passenger_name, "flight"));
        let carrier = CARRIERS.choose(&mut rng).copied().unwrap_or("AK");
        let number: u16 = rng.gen_range(1..=9999);
        let mut airports = AIRPORTS.choose_multiple(&mut rng, 2);
        let origin = airports.next().copied().unwrap_or("MSP");
        let destination = airports.next().copied().unwrap_or("ATL");
        let status = match rng.gen_range(0..10) {
            0 => "Canceled",
            1 | 2 => "Delayed",
            _ => "OnTime",
        };
        let minutes: i32 = rng.gen_range(5..=75);

        debug!(passenger = %passenger_name, "Finish fetching flight info");
        Ok(format!(
            "{carrier}{number},{origin},{destination},{status},{minutes}"
        ))
    }

    async fn lookup_loyalty(&self, passenger_name: &str) -> FetchResult<String> {
        debug!(passenger = %passenger_name, "Starting fetching loyalty info");
        self.wait_for_service(passenger_name).await?;

        let mut rng = StdRng::seed_from_u64(seed_for(passenger_name, "loyalty"));
        let tier = LoyaltyTier::ALL
            .choose(&mut rng)
            .copied()
            .unwrap_or(LoyaltyTier::Bronze);
        let miles_flown: u64 = rng.gen_range(0..250_000);
        let miles_to_next: u64 = rng.gen_range(0..50_000);

        debug!(passenger = %passenger_name, "Finish fetching loyalty info");
        Ok(format!("{tier},{miles_flown},{miles_to_next}"))
    }

    async fn wait_for_service(&self, passenger_name: &str) -> FetchResult<()> {
        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }
        if self.unavailable.contains(passenger_name) {
            return Err(FetchError::Unavailable {
                name: passenger_name.to_string(),
                reason: "status service did not respond".into(),
            });
        }
        Ok(())
    }
}

impl Default for SampleFetcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[async_trait::async_trait]
impl FlightFetcher for SampleFetcher {
    async fn fetch(&self, passenger_name: &str) -> FetchResult<FlightStatus> {
        let (flight_response, loyalty_response) = tokio::join!(
            self.lookup_flight(passenger_name),
            self.lookup_loyalty(passenger_name)
        );

        if !self.combine_delay.is_zero() {
            tokio::time::sleep(self.combine_delay).await;
        }
        debug!(passenger = %passenger_name, "Combining flight data");

        FlightStatus::parse(passenger_name, &flight_response?, &loyalty_response?)
    }

    fn describe(&self) -> String {
        "sample service".to_string()
    }
}

/// Stable FNV-1a seed so sample data does not change between runs
fn seed_for(passenger_name: &str, lookup: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    passenger_name
        .bytes()
        .chain([0u8])
        .chain(lookup.bytes())
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}
