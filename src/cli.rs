//! Command-line interface definitions for price_pulse.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! File locations can also be provided via environment variables.

use crate::config::TrackerConfig;
use crate::storage::catalog::CorruptCatalogPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for price_pulse.
///
/// # Examples
///
/// ```sh
/// # Track a product (prints the updated record as JSON)
/// price_pulse track https://www.amazon.in/dp/B09G9FPHY6
///
/// # Print every tracked product
/// price_pulse list
///
/// # Keep data somewhere else and use a custom fallback rate
/// price_pulse -d /var/lib/price_pulse/product_data.json --fallback-rate 84 track <URL>
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, global = true, env = "PRICE_PULSE_CONFIG")]
    pub config: Option<String>,

    /// Catalog JSON file (default: product_data.json)
    #[arg(short, long, global = true, env = "PRICE_PULSE_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// File listing tracked URLs for the scheduled job (default: products.txt)
    #[arg(short, long, global = true, env = "PRICE_PULSE_PRODUCTS_FILE")]
    pub products_file: Option<PathBuf>,

    /// USD→INR rate to use when the live rate cannot be fetched (default: 83.5)
    #[arg(long, global = true)]
    pub fallback_rate: Option<f64>,

    /// Move a corrupt catalog file aside and start over instead of failing
    #[arg(long, global = true)]
    pub reset_corrupt_catalog: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Print every tracked product as JSON
    List,
    /// Scrape a product page and append its current price to the history
    Track {
        /// Product page URL containing /dp/<ID> or /gp/product/<ID>
        url: String,
    },
}

impl Cli {
    /// Apply flags given on the command line on top of `config`.
    pub fn apply_overrides(&self, config: &mut TrackerConfig) {
        if let Some(path) = &self.data_file {
            config.data_file = path.clone();
        }
        if let Some(path) = &self.products_file {
            config.products_file = path.clone();
        }
        if let Some(rate) = self.fallback_rate {
            config.fallback_rate = rate;
        }
        if self.reset_corrupt_catalog {
            config.corrupt_catalog = CorruptCatalogPolicy::ResetEmpty;
        }
    }
}
