//! Fixture-backed fetcher for offline runs
//!
//! Fixture files are JSON objects keyed by passenger name:
//!
//! ```json
//! {
//!   "Madrigal": {
//!     "flight_number": "AK112",
//!     "origin_airport": "MSP",
//!     "destination_airport": "ATL",
//!     "status": "OnTime",
//!     "departure_minutes": 42,
//!     "loyalty_tier": "Gold",
//!     "phase": "WaitingToBoard"
//!   }
//! }
//! ```
//!
//! `phase` is optional. When present it is carried on the record as the
//! reported phase in place of the derived one; text naming no known phase
//! rejects the whole file.

use super::FlightFetcher;
use crate::error::{FetchError, FetchResult};
use crate::flight::{FlightInfo, FlightStatus, LoyaltyTier};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// One passenger's entry in a fixture file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureEntry {
    pub flight_number: String,
    pub origin_airport: String,
    pub destination_airport: String,
    pub status: String,
    pub departure_minutes: i32,
    pub loyalty_tier: String,
    #[serde(default)]
    pub phase: Option<String>,
}

impl FixtureEntry {
    /// Convert into a status record for the given passenger
    pub fn into_status(self, passenger_name: &str) -> FetchResult<FlightStatus> {
        let malformed = |reason: String| FetchError::MalformedResponse {
            name: passenger_name.to_string(),
            reason,
        };

        let flight = FlightInfo {
            flight_number: self.flight_number,
            origin_airport: self.origin_airport,
            destination_airport: self.destination_airport,
            status: self.status,
        };
        if !flight.has_valid_flight_number() {
            return Err(malformed(format!(
                "invalid flight number '{}'",
                flight.flight_number
            )));
        }

        let tier: LoyaltyTier = self
            .loyalty_tier
            .parse()
            .map_err(|e: crate::flight::ParseFieldError| malformed(e.to_string()))?;

        let status = FlightStatus::new(passenger_name, flight, tier, self.departure_minutes);

        match self.phase {
            Some(phase) => status
                .with_reported_phase_text(&phase)
                .map_err(|e| malformed(e.to_string())),
            None => Ok(status),
        }
    }
}

/// Serves status records loaded from a fixture file
#[derive(Debug, Clone, Default)]
pub struct FixtureFetcher {
    flights: HashMap<String, FlightStatus>,
    source: String,
}

impl FixtureFetcher {
    /// Load fixtures from a JSON file
    pub fn from_path(path: &Path) -> FetchResult<Self> {
        let fixture_error = |reason: String| FetchError::Fixture {
            path: path.to_path_buf(),
            reason,
        };

        let json = std::fs::read_to_string(path).map_err(|e| fixture_error(e.to_string()))?;
        let entries: BTreeMap<String, FixtureEntry> =
            serde_json::from_str(&json).map_err(|e| fixture_error(e.to_string()))?;

        let mut fetcher = Self::from_entries(entries)?;
        fetcher.source = path.display().to_string();

        info!(
            path = %path.display(),
            flights = fetcher.flights.len(),
            "Loaded flight fixtures"
        );
        Ok(fetcher)
    }

    /// Build from already-parsed entries
    pub fn from_entries(entries: BTreeMap<String, FixtureEntry>) -> FetchResult<Self> {
        let flights = entries
            .into_iter()
            .map(|(name, entry)| {
                let status = entry.into_status(&name)?;
                Ok((name, status))
            })
            .collect::<FetchResult<HashMap<_, _>>>()?;

        Ok(Self {
            flights,
            source: "inline".to_string(),
        })
    }

    /// Passenger names present in the fixtures, sorted
    pub fn passenger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.flights.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of fixture records
    pub fn len(&self) -> usize {
        self.flights.len()
    }

    /// Check if no fixtures were loaded
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

#[async_trait::async_trait]
impl FlightFetcher for FixtureFetcher {
    async fn fetch(&self, passenger_name: &str) -> FetchResult<FlightStatus> {
        debug!(passenger = %passenger_name, "Looking up fixture");
        self.flights
            .get(passenger_name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                name: passenger_name.to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("fixtures ({})", self.source)
    }
}
