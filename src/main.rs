//! flight-watcher - Passenger flight tracker
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use flight_watcher::config::{CliArgs, TrackerConfig};
use flight_watcher::fetch::{FixtureFetcher, FlightFetcher, SampleFetcher};
use flight_watcher::output::ConsoleSink;
use flight_watcher::progress::{print_header, print_summary, FetchProgress};
use flight_watcher::tracker::FlightTracker;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let mut config = TrackerConfig::from_args(args).context("Invalid configuration")?;

    let fetcher: Arc<dyn FlightFetcher> = match &config.fixtures_path {
        Some(path) => {
            let fixtures = FixtureFetcher::from_path(path).context("Failed to load fixtures")?;
            if config.passenger_names.is_empty() {
                config.passenger_names = fixtures.passenger_names();
            }
            Arc::new(fixtures)
        }
        None => Arc::new(SampleFetcher::new(config.fetch_delay)),
    };

    if config.show_progress {
        print_header(&config, &fetcher.describe());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(track(config, fetcher))
}

async fn track(config: TrackerConfig, fetcher: Arc<dyn FlightFetcher>) -> Result<()> {
    let show_progress = config.show_progress;
    let print_json = config.print_json;

    let progress = if show_progress {
        FetchProgress::new()
    } else {
        FetchProgress::hidden()
    };

    let tracker = FlightTracker::new(config, fetcher, Arc::new(ConsoleSink::new()))
        .context("Failed to initialize tracker")?
        .with_progress(progress.callback());

    // Setup signal handler for graceful shutdown
    let shutdown = tracker.shutdown_token();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown.cancel();
    })
    .context("Failed to set signal handler")?;

    // Fetch phase
    let flights = match tracker.fetch().await {
        Ok(flights) => flights,
        Err(e) => {
            progress.finish("Fetch failed");
            return Err(e).context("Fetching flights failed");
        }
    };
    progress.finish_and_clear();

    if print_json {
        let json =
            serde_json::to_string_pretty(&flights).context("Failed to serialize flights")?;
        println!("{}", json);
    }

    // Watch phase
    let report = tracker.track(flights).await.context("Tracking failed")?;

    if show_progress {
        print_summary(&report);
    }

    info!(
        flights = report.flights_tracked,
        ticks = report.ticks_emitted,
        "Run finished"
    );

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("flight_watcher=debug,warn")
    } else {
        EnvFilter::new("flight_watcher=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
