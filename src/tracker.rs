//! The two operations offered to callers: list the catalog, track a URL.

use crate::api::{HttpFetcher, PageFetcher};
use crate::config::TrackerConfig;
use crate::error::TrackError;
use crate::models::{ProductCatalog, ProductRecord};
use crate::pipeline::ScrapePipeline;
use crate::rates::{CurrencyRateProvider, RateSource};
use crate::storage::catalog::PriceStore;
use crate::storage::registry::UrlRegistry;
use tracing::{error, info, instrument};

/// Lists the catalog and tracks product URLs, persisting each observation.
pub struct Tracker<F, R> {
    pipeline: ScrapePipeline<F, R>,
    store: PriceStore,
    registry: UrlRegistry,
}

impl Tracker<HttpFetcher, CurrencyRateProvider> {
    /// Wire up the production HTTP fetcher, rate provider and files.
    ///
    /// The configuration is validated first, so overrides applied after
    /// loading are held to the same rules as the file.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, TrackError> {
        config.validate()?;
        let fetcher = HttpFetcher::new(&config.request, config.page_timeout())?;
        let rates = CurrencyRateProvider::new(config.rate_endpoint.clone(), config.rate_timeout())
            .map_err(|e| TrackError::Config {
                path: "rate_endpoint".to_string(),
                reason: e.to_string(),
            })?;
        let pipeline = ScrapePipeline::new(fetcher, rates, config.fallback_rate()?);

        Ok(Tracker::new(
            pipeline,
            PriceStore::new(&config.data_file, config.corrupt_catalog),
            UrlRegistry::new(&config.products_file),
        ))
    }
}

impl<F, R> Tracker<F, R>
where
    F: PageFetcher,
    R: RateSource,
{
    pub fn new(pipeline: ScrapePipeline<F, R>, store: PriceStore, registry: UrlRegistry) -> Self {
        info!(
            catalog = %store.path().display(),
            registry = %registry.path().display(),
            "Tracker ready"
        );
        Tracker {
            pipeline,
            store,
            registry,
        }
    }

    /// Every tracked product. Never writes anything.
    pub async fn list_all(&self) -> Result<ProductCatalog, TrackError> {
        self.store.load().await
    }

    /// Scrape `url`, merge the observation into the catalog and register the
    /// URL for scheduled re-scrapes.
    ///
    /// Returns the product's record after the merge. Nothing is written when
    /// the scrape fails. A registry write failure is logged but does not fail
    /// the call, since the observation is already persisted by then.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn track(&self, url: &str) -> Result<ProductRecord, TrackError> {
        let delta = self.pipeline.scrape(url).await?;
        let record = self.store.merge_and_persist(delta).await?;

        if let Err(e) = self.registry.ensure_present(url).await {
            error!(error = %e, "Failed to register URL for scheduled tracking");
        }
        Ok(record)
    }
}
