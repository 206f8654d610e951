//! # price_pulse
//!
//! Tracks e-commerce product prices over time. Given a product page URL it
//! derives the product identifier, scrapes the displayed title, image and
//! price, converts the price to INR, and appends the observation to a JSON
//! catalog keyed by product identifier.
//!
//! ## Usage
//!
//! ```sh
//! price_pulse track https://www.amazon.in/dp/B09G9FPHY6
//! price_pulse list
//! ```
//!
//! ## Architecture
//!
//! A tracking request is one linear pipeline:
//! 1. **Identify**: derive the product identifier from the URL (no network on failure)
//! 2. **Fetch**: download the product page with static browser headers
//! 3. **Extract**: title, image and price via ordered selector strategies
//! 4. **Normalize**: convert USD prices to INR (live rate, or fallback)
//! 5. **Persist**: merge into the catalog, rewrite it, register the URL

use clap::Parser;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod pipeline;
mod rates;
mod scrapers;
mod storage;
mod tracker;
mod utils;

#[cfg(test)]
mod test_support;

use cli::{Cli, Command};
use config::TrackerConfig;
use tracker::Tracker;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    // stdout carries the JSON output, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = TrackerConfig::load(args.config.as_deref()).await?;
    args.apply_overrides(&mut config);
    debug!(?config, "Effective configuration");

    let tracker = Tracker::from_config(&config)?;

    match &args.command {
        Command::List => {
            let catalog = tracker.list_all().await?;
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            info!(products = catalog.len(), "Listed catalog");
        }
        Command::Track { url } => match tracker.track(url).await {
            Ok(record) => {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            Err(e) => {
                error!(%url, error = %e, "Tracking failed");
                println!("{}", serde_json::json!({ "error": e.to_string() }));
                return Err(e.into());
            }
        },
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, millis = elapsed.as_millis() as u64, "Execution complete");
    Ok(())
}
