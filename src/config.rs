//! Runtime configuration loaded from an optional YAML file.
//!
//! Every key is optional; missing keys take the defaults below. Command-line
//! flags are applied on top by [`crate::cli::Cli::apply_overrides`].
//!
//! ```yaml
//! data_file: product_data.json
//! products_file: products.txt
//! fallback_rate: 83.5
//! rate_endpoint: https://api.exchangerate-api.com/v4/latest/USD
//! page_timeout_secs: 10
//! rate_timeout_secs: 5
//! corrupt_catalog: fail        # or reset_empty
//! request:
//!   user_agent: "Mozilla/5.0 ..."
//!   accept_language: "en-US,en;q=0.9,hi;q=0.8"
//! ```

use crate::api::RequestProfile;
use crate::error::TrackError;
use crate::rates::DEFAULT_RATE_ENDPOINT;
use crate::storage::catalog::CorruptCatalogPolicy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Catalog JSON file.
    pub data_file: PathBuf,
    /// URL registry read by the scheduled re-scrape job.
    pub products_file: PathBuf,
    /// USD→INR rate used when the rate source is unavailable.
    pub fallback_rate: f64,
    pub rate_endpoint: String,
    pub page_timeout_secs: u64,
    pub rate_timeout_secs: u64,
    pub corrupt_catalog: CorruptCatalogPolicy,
    pub request: RequestProfile,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            data_file: PathBuf::from("product_data.json"),
            products_file: PathBuf::from("products.txt"),
            fallback_rate: 83.5,
            rate_endpoint: DEFAULT_RATE_ENDPOINT.to_string(),
            page_timeout_secs: 10,
            rate_timeout_secs: 5,
            corrupt_catalog: CorruptCatalogPolicy::Fail,
            request: RequestProfile::default(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, TrackError> {
        let Some(path) = path else {
            return Ok(TrackerConfig::default());
        };

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TrackError::Config {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        let config = Self::from_yaml(&text).map_err(|reason| TrackError::Config {
            path: path.to_string(),
            reason,
        })?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    fn from_yaml(text: &str) -> Result<Self, String> {
        let config: TrackerConfig = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
        config.check()?;
        Ok(config)
    }

    /// Reject settings that cannot work, whichever layer supplied them.
    ///
    /// Run again after CLI overrides are applied, since those never pass
    /// through [`TrackerConfig::load`].
    pub fn validate(&self) -> Result<(), TrackError> {
        self.check().map_err(|reason| TrackError::Config {
            path: "effective configuration".to_string(),
            reason,
        })
    }

    fn check(&self) -> Result<(), String> {
        if !(self.fallback_rate.is_finite() && self.fallback_rate > 0.0) {
            return Err(format!("fallback_rate must be positive, got {}", self.fallback_rate));
        }
        if self.page_timeout_secs == 0 || self.rate_timeout_secs == 0 {
            return Err("timeouts must be at least one second".to_string());
        }
        Ok(())
    }

    /// The fallback rate as an exact decimal (`83.5` stays `83.5`).
    pub fn fallback_rate(&self) -> Result<Decimal, TrackError> {
        Decimal::from_str(&self.fallback_rate.to_string()).map_err(|e| TrackError::Config {
            path: "fallback_rate".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn rate_timeout(&self) -> Duration {
        Duration::from_secs(self.rate_timeout_secs)
    }
}
