//! Configuration types for flight-watcher
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 64;

/// Passengers tracked when none are given
pub const DEFAULT_PASSENGERS: [&str; 4] = ["Madrigal", "Polarcubis", "Estragon", "Taernyl"];

/// Track passengers' flights from check-in until departure
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flight-watcher",
    version,
    about = "Track passengers' flights from check-in until departure",
    long_about = "Fetches each passenger's flight with a bounded pool of workers, then \
                  republishes the boarding status of every flight at a fixed interval \
                  until it departs or is canceled.\n\n\
                  Without --fixtures, flights come from a built-in sample service that \
                  answers every passenger name.",
    after_help = "EXAMPLES:\n    \
        flight-watcher\n    \
        flight-watcher Madrigal Estragon -w 4 --interval-ms 200\n    \
        flight-watcher --concurrent --fetch-delay-ms 0\n    \
        flight-watcher --fixtures flights.json --json"
)]
pub struct CliArgs {
    /// Passenger names to track (defaults to the sample passengers)
    #[arg(value_name = "PASSENGER")]
    pub passengers: Vec<String>,

    /// Number of fetch workers
    #[arg(short = 'w', long, default_value = "2", value_name = "NUM")]
    pub workers: usize,

    /// Milliseconds between status updates for one flight
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub interval_ms: u64,

    /// Simulated latency of the sample service, in milliseconds
    #[arg(long, default_value = "500", value_name = "MS")]
    pub fetch_delay_ms: u64,

    /// Watch all flights at the same time instead of one after another
    #[arg(long)]
    pub concurrent: bool,

    /// Load flights from a JSON fixture file instead of the sample service
    #[arg(long, value_name = "FILE")]
    pub fixtures: Option<PathBuf>,

    /// Print the fetched flights as JSON before watching
    #[arg(long)]
    pub json: bool,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// How the fetched flights are watched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchMode {
    /// One flight after another
    #[default]
    Sequential,

    /// All flights at once
    Concurrent,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Passengers to track; filled from the fixture file when empty
    pub passenger_names: Vec<String>,

    /// Number of fetch workers
    pub worker_count: usize,

    /// Delay between two status lines of one flight
    pub tick_interval: Duration,

    /// Combine delay of the sample service
    pub fetch_delay: Duration,

    /// Sequential or concurrent watches
    pub watch_mode: WatchMode,

    /// Fixture file for offline runs
    pub fixtures_path: Option<PathBuf>,

    /// Show progress indicator
    pub show_progress: bool,

    /// Print fetched flights as JSON
    pub print_json: bool,
}

impl TrackerConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let passenger_names = if args.passengers.is_empty() && args.fixtures.is_none() {
            DEFAULT_PASSENGERS.iter().map(|name| name.to_string()).collect()
        } else {
            args.passengers
                .iter()
                .map(|name| name.trim().to_string())
                .collect()
        };

        if let Some(path) = &args.fixtures {
            if !path.is_file() {
                return Err(ConfigError::InvalidFixturePath {
                    path: path.clone(),
                    reason: "File does not exist".to_string(),
                });
            }
        }

        let config = Self {
            passenger_names,
            worker_count: args.workers,
            tick_interval: Duration::from_millis(args.interval_ms),
            fetch_delay: Duration::from_millis(args.fetch_delay_ms),
            watch_mode: if args.concurrent {
                WatchMode::Concurrent
            } else {
                WatchMode::Sequential
            },
            fixtures_path: args.fixtures,
            show_progress: !args.quiet,
            print_json: args.json,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the values that `from_args` cannot guarantee by construction
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 || self.worker_count > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.worker_count,
                max: MAX_WORKERS,
            });
        }

        if self.tick_interval.is_zero() {
            return Err(ConfigError::InvalidInterval {
                millis: self.tick_interval.as_millis() as u64,
            });
        }

        let mut seen = HashSet::new();
        for name in &self.passenger_names {
            if name.is_empty() {
                return Err(ConfigError::EmptyPassengerName);
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicatePassenger { name: name.clone() });
            }
        }

        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            passenger_names: DEFAULT_PASSENGERS.iter().map(|name| name.to_string()).collect(),
            worker_count: 2,
            tick_interval: Duration::from_secs(1),
            fetch_delay: Duration::from_millis(500),
            watch_mode: WatchMode::Sequential,
            fixtures_path: None,
            show_progress: true,
            print_json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<TrackerConfig, ConfigError> {
        let cli = CliArgs::try_parse_from(std::iter::once("flight-watcher").chain(args.iter().copied()))
            .unwrap();
        TrackerConfig::from_args(cli)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap();

        assert_eq!(config.passenger_names, DEFAULT_PASSENGERS);
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.fetch_delay, Duration::from_millis(500));
        assert_eq!(config.watch_mode, WatchMode::Sequential);
        assert!(config.show_progress);
    }

    #[test]
    fn test_explicit_passengers() {
        let config = parse(&["A", " B ", "-w", "4", "--concurrent", "-q"]).unwrap();

        assert_eq!(config.passenger_names, vec!["A", "B"]);
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.watch_mode, WatchMode::Concurrent);
        assert!(!config.show_progress);
    }

    #[test]
    fn test_invalid_worker_count() {
        assert!(matches!(
            parse(&["-w", "0"]),
            Err(ConfigError::InvalidWorkerCount { count: 0, .. })
        ));
        assert!(matches!(
            parse(&["-w", "65"]),
            Err(ConfigError::InvalidWorkerCount { count: 65, .. })
        ));
    }

    #[test]
    fn test_invalid_interval() {
        assert!(matches!(
            parse(&["--interval-ms", "0"]),
            Err(ConfigError::InvalidInterval { millis: 0 })
        ));
    }

    #[test]
    fn test_duplicate_and_empty_names() {
        assert!(matches!(
            parse(&["A", "B", "A"]),
            Err(ConfigError::DuplicatePassenger { .. })
        ));
        assert!(matches!(
            parse(&["A", "  "]),
            Err(ConfigError::EmptyPassengerName)
        ));
    }

    #[test]
    fn test_missing_fixture_file() {
        assert!(matches!(
            parse(&["--fixtures", "/nonexistent/flights.json"]),
            Err(ConfigError::InvalidFixturePath { .. })
        ));
    }

    #[test]
    fn test_fixture_without_names() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();

        let config = parse(&["--fixtures", path]).unwrap();
        assert!(config.passenger_names.is_empty());
        assert!(config.fixtures_path.is_some());
    }

    #[test]
    fn test_default_is_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
    }
}
