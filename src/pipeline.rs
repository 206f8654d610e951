//! One scrape: URL → identifier → page → fields → INR price → delta.
//!
//! The pipeline either resolves every required field (identifier, title,
//! price, currency) or fails as a whole; it never hands out a partial delta
//! and never touches persisted state.

use crate::api::PageFetcher;
use crate::error::TrackError;
use crate::models::{Currency, PriceObservation, ProductRecordDelta};
use crate::rates::RateSource;
use crate::scrapers::{extract_raw, identifier::extract_identifier, price::parse_price};
use crate::utils::truncate_for_log;
use chrono::Local;
use reqwest::header::CONTENT_TYPE;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, instrument, warn};

/// Convert `amount` to INR.
///
/// Reference-currency amounts pass through untouched. Foreign amounts are
/// multiplied by `rate` and rounded half away from zero to 2 places.
///
/// # Errors
///
/// [`TrackError::PriceParse`] when the converted amount does not fit in a
/// `Decimal`.
pub fn normalize_price(
    amount: Decimal,
    currency: Currency,
    rate: Decimal,
) -> Result<Decimal, TrackError> {
    if currency.is_reference() {
        return Ok(amount);
    }
    amount
        .checked_mul(rate)
        .map(|converted| converted.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(|| TrackError::PriceParse {
            text: format!("{}{amount} at rate {rate}", currency.code()),
        })
}

/// Orchestrates fetching, extraction and normalization for a single URL.
#[derive(Debug)]
pub struct ScrapePipeline<F, R> {
    fetcher: F,
    rates: R,
    fallback_rate: Decimal,
}

impl<F, R> ScrapePipeline<F, R>
where
    F: PageFetcher,
    R: RateSource,
{
    /// `fallback_rate` is used whenever the rate source cannot answer.
    pub fn new(fetcher: F, rates: R, fallback_rate: Decimal) -> Self {
        ScrapePipeline {
            fetcher,
            rates,
            fallback_rate,
        }
    }

    /// Scrape `url` into a delta ready to merge into the catalog.
    ///
    /// The identifier is derived before any network access. The rate source
    /// is only consulted for prices shown in a foreign currency.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn scrape(&self, url: &str) -> Result<ProductRecordDelta, TrackError> {
        let identifier = extract_identifier(url)?;

        let page = self.fetcher.fetch(url).await?;
        if !page.is_success() {
            warn!(%identifier, status = page.status, "Product page returned an error status");
            return Err(TrackError::Transport {
                url: url.to_string(),
                reason: format!("http status {}", page.status),
            });
        }

        let content_type = page
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        debug!(%identifier, content_type, bytes = page.body.len(), "Parsing product page");

        let raw = extract_raw(&page.body, &identifier).inspect_err(|e| {
            warn!(
                %identifier,
                error = %e,
                body_preview = %truncate_for_log(&page.body, 300),
                "Product page is missing a required field"
            )
        })?;
        let amount = parse_price(&raw.price_text)?;

        let price = if raw.currency.is_reference() {
            amount
        } else {
            let rate = self.rates.reference_rate(self.fallback_rate).await;
            let converted = normalize_price(amount, raw.currency, rate).inspect_err(|e| {
                warn!(%identifier, %amount, %rate, error = %e, "Converted price is out of range")
            })?;
            info!(%identifier, %amount, %rate, %converted, currency = raw.currency.code(), "Converted price to INR");
            converted
        };

        info!(%identifier, %price, title = %raw.title, "Scraped product");
        Ok(ProductRecordDelta {
            identifier,
            title: raw.title,
            image_url: raw.image_url,
            source_url: url.to_string(),
            observation: PriceObservation {
                timestamp: Local::now().naive_local(),
                price,
            },
        })
    }
}
