//! Progress reporting for the tracker
//!
//! A spinner runs while flights are being fetched; the run header and the
//! final summary are printed with `console` styling.

use crate::config::{TrackerConfig, WatchMode};
use crate::pool::ProgressCallback;
use crate::tracker::TrackReport;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Spinner shown during the fetch phase
#[derive(Clone)]
pub struct FetchProgress {
    bar: ProgressBar,
}

impl FetchProgress {
    /// Create a new spinner
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A spinner that draws nothing, for quiet mode
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update the progress display
    pub fn update(&self, fetched: usize, total: usize) {
        self.bar.set_message(fetch_message(fetched, total));
    }

    /// Callback for the fetch pool
    pub fn callback(&self) -> ProgressCallback {
        let progress = self.clone();
        Arc::new(move |fetched, total| progress.update(fetched, total))
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for FetchProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn fetch_message(fetched: usize, total: usize) -> String {
    let percent = if total > 0 {
        fetched as f64 * 100.0 / total as f64
    } else {
        100.0
    };
    format!("Fetching flights: {}/{} ({:.0}%)", fetched, total, percent)
}

/// Print a summary of the tracking run
pub fn print_summary(report: &TrackReport) {
    let duration_secs = report.duration.as_secs_f64();

    println!();
    println!("{}", style("Tracking Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Flights fetched:").bold(), report.flights_fetched);
    println!("  {} {}", style("Flights tracked:").bold(), report.flights_tracked);
    println!("  {} {}", style("Status updates:").bold(), report.ticks_emitted);
    println!("  {} {:.1}s", style("Duration:").bold(), duration_secs);
    println!();
}

/// Print a header at the start of the run
pub fn print_header(config: &TrackerConfig, source: &str) {
    let mode = match config.watch_mode {
        WatchMode::Sequential => "sequential",
        WatchMode::Concurrent => "concurrent",
    };

    println!();
    println!(
        "{} {}",
        style("flight-watcher").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Source:").bold(), source);
    println!("  {} {}", style("Workers:").bold(), config.worker_count);
    println!(
        "  {} {}ms ({})",
        style("Interval:").bold(),
        config.tick_interval.as_millis(),
        mode
    );
    println!();
}
