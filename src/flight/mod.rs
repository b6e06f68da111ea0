//! Flight status data model
//!
//! `FlightStatus` is the record passed through the whole tracker: the
//! fetch pool produces one per passenger, and each watch advances it one
//! minute per tick until departure.

mod types;

pub use types::{
    BoardingState, FlightInfo, FlightStatus, LoyaltyTier, ParseFieldError, BOARDING_CLOSES_AT,
    GATE_OPENS_AT,
};
