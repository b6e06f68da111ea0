//! Flight status records and boarding phase derivation
//!
//! A `FlightStatus` is an immutable snapshot of one passenger's flight.
//! Its boarding phase is derived from the cancellation flag, the minutes
//! left until departure and the passenger's loyalty tier, unless the source
//! reported one. Advancing a record yields a new record one minute closer to
//! departure; a derived phase is derived again, a reported phase is carried.

use crate::error::{FetchError, FetchResult, WatchError, WatchResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Boarding closes this many minutes before departure
pub const BOARDING_CLOSES_AT: i32 = 15;

/// Passengers are called to the gate this many minutes before departure
pub const GATE_OPENS_AT: i32 = 60;

/// Flight numbers look like "AK1234": two-character carrier code and 1-4 digits
static FLIGHT_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]{2}\d{1,4}$").expect("Invalid flight number regex")
});

/// A text field that did not match any known value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised {field} '{value}'")]
pub struct ParseFieldError {
    pub field: &'static str,
    pub value: String,
}

/// Frequent-flyer tier, which decides how early a passenger may board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Titanium,
    Diamond,
}

impl LoyaltyTier {
    /// Minutes before departure at which this tier may start boarding
    pub fn boarding_window_start(&self) -> i32 {
        match self {
            LoyaltyTier::Bronze => 25,
            LoyaltyTier::Silver => 25,
            LoyaltyTier::Gold => 30,
            LoyaltyTier::Platinum => 35,
            LoyaltyTier::Titanium => 40,
            LoyaltyTier::Diamond => 45,
        }
    }

    /// All tiers, lowest first
    pub const ALL: [LoyaltyTier; 6] = [
        LoyaltyTier::Bronze,
        LoyaltyTier::Silver,
        LoyaltyTier::Gold,
        LoyaltyTier::Platinum,
        LoyaltyTier::Titanium,
        LoyaltyTier::Diamond,
    ];
}

impl fmt::Display for LoyaltyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoyaltyTier::Bronze => "Bronze",
            LoyaltyTier::Silver => "Silver",
            LoyaltyTier::Gold => "Gold",
            LoyaltyTier::Platinum => "Platinum",
            LoyaltyTier::Titanium => "Titanium",
            LoyaltyTier::Diamond => "Diamond",
        };
        f.write_str(name)
    }
}

impl FromStr for LoyaltyTier {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoyaltyTier::ALL
            .into_iter()
            .find(|tier| tier.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseFieldError {
                field: "loyalty tier",
                value: s.to_string(),
            })
    }
}

/// Boarding phase of a flight, as seen by one passenger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardingState {
    FlightCanceled,
    BoardingNotStarted,
    WaitingToBoard,
    Boarding,
    BoardingEnded,
}

impl BoardingState {
    /// Derive the phase for a flight
    ///
    /// Rules are checked in order: canceled, gate closed, passenger's tier
    /// may board, others are boarding, boarding not yet started.
    pub fn derive(canceled: bool, minutes_to_departure: i32, tier: LoyaltyTier) -> Self {
        if canceled {
            BoardingState::FlightCanceled
        } else if minutes_to_departure < BOARDING_CLOSES_AT {
            BoardingState::BoardingEnded
        } else if minutes_to_departure <= tier.boarding_window_start() {
            BoardingState::Boarding
        } else if minutes_to_departure <= GATE_OPENS_AT {
            BoardingState::WaitingToBoard
        } else {
            BoardingState::BoardingNotStarted
        }
    }

    /// Message shown to the passenger for this phase
    pub fn message(&self) -> &'static str {
        match self {
            BoardingState::FlightCanceled => "Your flight was canceled",
            BoardingState::BoardingNotStarted => "Boarding will start soon",
            BoardingState::WaitingToBoard => "Other passengers are boarding",
            BoardingState::Boarding => "You can now board the plane",
            BoardingState::BoardingEnded => "The boarding doors have closed",
        }
    }
}

impl fmt::Display for BoardingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BoardingState::FlightCanceled => "FlightCanceled",
            BoardingState::BoardingNotStarted => "BoardingNotStarted",
            BoardingState::WaitingToBoard => "WaitingToBoard",
            BoardingState::Boarding => "Boarding",
            BoardingState::BoardingEnded => "BoardingEnded",
        };
        f.write_str(name)
    }
}

impl FromStr for BoardingState {
    type Err = ParseFieldError;

    /// Accepts the variant names and the short lifecycle names
    /// (Canceled, NotStarted, Waiting, Active, Ended), ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let phase = match s.trim().to_ascii_lowercase().as_str() {
            "flightcanceled" | "canceled" => BoardingState::FlightCanceled,
            "boardingnotstarted" | "notstarted" => BoardingState::BoardingNotStarted,
            "waitingtoboard" | "waiting" => BoardingState::WaitingToBoard,
            "boarding" | "active" => BoardingState::Boarding,
            "boardingended" | "ended" => BoardingState::BoardingEnded,
            _ => {
                return Err(ParseFieldError {
                    field: "boarding phase",
                    value: s.to_string(),
                })
            }
        };
        Ok(phase)
    }
}

/// Flight details as reported by the status service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightInfo {
    /// Carrier code and number, e.g. "AK1234"
    pub flight_number: String,

    /// IATA code of the departure airport
    pub origin_airport: String,

    /// IATA code of the arrival airport
    pub destination_airport: String,

    /// Raw status text ("OnTime", "Delayed", "Canceled", ...)
    pub status: String,
}

impl FlightInfo {
    /// Check whether the raw status marks the flight as canceled
    pub fn is_canceled(&self) -> bool {
        self.status.eq_ignore_ascii_case("canceled")
    }

    /// Check the flight number format
    pub fn has_valid_flight_number(&self) -> bool {
        FLIGHT_NUMBER_REGEX.is_match(&self.flight_number)
    }
}

/// Immutable snapshot of one passenger's flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightStatus {
    passenger_name: String,
    flight: FlightInfo,
    loyalty_tier: LoyaltyTier,
    departure_time_in_minutes: i32,
    phase: BoardingState,
    #[serde(skip)]
    phase_reported: bool,
    fetched_at: DateTime<Utc>,
}

impl FlightStatus {
    /// Build a status record, deriving its boarding phase
    pub fn new(
        passenger_name: impl Into<String>,
        flight: FlightInfo,
        loyalty_tier: LoyaltyTier,
        departure_time_in_minutes: i32,
    ) -> Self {
        let phase = BoardingState::derive(
            flight.is_canceled(),
            departure_time_in_minutes,
            loyalty_tier,
        );

        Self {
            passenger_name: passenger_name.into(),
            flight,
            loyalty_tier,
            departure_time_in_minutes,
            phase,
            phase_reported: false,
            fetched_at: Utc::now(),
        }
    }

    /// Combine a flight response and a loyalty response into a record
    ///
    /// Flight response: `FLIGHT_NUMBER,ORIGIN,DESTINATION,STATUS,DEPARTURE_MINUTES`
    /// Loyalty response: `TIER,MILES_FLOWN,MILES_TO_NEXT_TIER`
    pub fn parse(
        passenger_name: &str,
        flight_response: &str,
        loyalty_response: &str,
    ) -> FetchResult<Self> {
        let malformed = |reason: String| FetchError::MalformedResponse {
            name: passenger_name.to_string(),
            reason,
        };

        if passenger_name.trim().is_empty() {
            return Err(malformed("empty passenger name".into()));
        }

        let fields: Vec<&str> = flight_response.trim().split(',').map(str::trim).collect();
        let &[flight_number, origin, destination, status, minutes] = fields.as_slice() else {
            return Err(malformed(format!(
                "flight response has {} fields, expected 5",
                fields.len()
            )));
        };

        let departure_time_in_minutes: i32 = minutes
            .parse()
            .map_err(|_| malformed(format!("invalid departure time '{}'", minutes)))?;

        let flight = FlightInfo {
            flight_number: flight_number.to_string(),
            origin_airport: origin.to_string(),
            destination_airport: destination.to_string(),
            status: status.to_string(),
        };
        if !flight.has_valid_flight_number() {
            return Err(malformed(format!("invalid flight number '{}'", flight_number)));
        }

        let loyalty_fields: Vec<&str> =
            loyalty_response.trim().split(',').map(str::trim).collect();
        let &[tier, miles_flown, miles_to_next] = loyalty_fields.as_slice() else {
            return Err(malformed(format!(
                "loyalty response has {} fields, expected 3",
                loyalty_fields.len()
            )));
        };
        for miles in [miles_flown, miles_to_next] {
            miles
                .parse::<u64>()
                .map_err(|_| malformed(format!("invalid mileage '{}'", miles)))?;
        }
        let loyalty_tier: LoyaltyTier = tier
            .parse()
            .map_err(|e: ParseFieldError| malformed(e.to_string()))?;

        Ok(Self::new(
            passenger_name,
            flight,
            loyalty_tier,
            departure_time_in_minutes,
        ))
    }

    /// Use the phase reported by the source instead of the derived one
    ///
    /// A reported phase is already resolved: it is carried unchanged through
    /// [`FlightStatus::advance`] and never checked against the derivation rule.
    pub fn with_reported_phase(mut self, phase: BoardingState) -> Self {
        self.phase = phase;
        self.phase_reported = true;
        self
    }

    /// Use a phase reported as text, failing with `InvalidPhase` when the
    /// text names none of the five phases
    pub fn with_reported_phase_text(self, phase: &str) -> WatchResult<Self> {
        let reported = phase.parse::<BoardingState>().map_err(|_| WatchError::InvalidPhase {
            flight: self.passenger_name.clone(),
            value: phase.to_string(),
        })?;
        Ok(self.with_reported_phase(reported))
    }

    /// Record one minute closer to departure
    pub fn advance(&self) -> Self {
        let departure_time_in_minutes = self.departure_time_in_minutes - 1;
        let phase = if self.phase_reported {
            self.phase
        } else {
            BoardingState::derive(
                self.flight.is_canceled(),
                departure_time_in_minutes,
                self.loyalty_tier,
            )
        };

        Self {
            passenger_name: self.passenger_name.clone(),
            flight: self.flight.clone(),
            loyalty_tier: self.loyalty_tier,
            departure_time_in_minutes,
            phase,
            phase_reported: self.phase_reported,
            fetched_at: self.fetched_at,
        }
    }

    pub fn passenger_name(&self) -> &str {
        &self.passenger_name
    }

    pub fn flight(&self) -> &FlightInfo {
        &self.flight
    }

    pub fn flight_number(&self) -> &str {
        &self.flight.flight_number
    }

    pub fn loyalty_tier(&self) -> LoyaltyTier {
        self.loyalty_tier
    }

    /// Minutes until departure
    pub fn departure_time_in_minutes(&self) -> i32 {
        self.departure_time_in_minutes
    }

    pub fn phase(&self) -> BoardingState {
        self.phase
    }

    /// Whether the phase came from the source rather than the derivation rule
    pub fn is_phase_reported(&self) -> bool {
        self.phase_reported
    }

    pub fn is_canceled(&self) -> bool {
        self.flight.is_canceled()
    }

    /// When the record was originally fetched
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {}->{}, {}, departs in {} min, {} tier, {})",
            self.passenger_name,
            self.flight.flight_number,
            self.flight.origin_airport,
            self.flight.destination_airport,
            self.flight.status,
            self.departure_time_in_minutes,
            self.loyalty_tier,
            self.phase,
        )
    }
}
