//! Extraction of product data from URLs and product page markup.
//!
//! # Submodules
//!
//! | Module | Input | Output |
//! |--------|-------|--------|
//! | [`identifier`] | product URL | 10-character product identifier |
//! | [`price`] | parsed page | price text + currency, via ordered strategies |
//! | [`product`] | parsed page | title + image URL (placeholder fallback) |
//!
//! All extractors are pure functions over their input, so they can be tested
//! against static HTML fixtures without any network access.

pub mod identifier;
pub mod price;
pub mod product;

use crate::error::TrackError;
use crate::models::{ProductIdentifier, RawExtraction};
use scraper::Html;
use tracing::debug;

/// Run the product and price extractors over one page.
///
/// The title is looked up first, so a page that lost both its title and its
/// price reports the missing title.
pub fn extract_raw(markup: &str, identifier: &ProductIdentifier) -> Result<RawExtraction, TrackError> {
    let document = Html::parse_document(markup);
    let (title, image_url) = product::extract_product(&document, identifier)?;
    let candidate = price::extract_price(&document)?;

    debug!(%identifier, strategy = candidate.strategy, "Extracted product fields");
    Ok(RawExtraction {
        title,
        price_text: candidate.text,
        currency: candidate.currency,
        image_url,
    })
}
