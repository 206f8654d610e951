//! Product identifier extraction from product page URLs.
//!
//! # URL Pattern
//!
//! Product pages carry their identifier in the path, either as
//! `/dp/B00TEST123` or `/gp/product/B00TEST123`, possibly followed by more
//! segments (`/ref=...`) and a query string.

use crate::error::TrackError;
use crate::models::ProductIdentifier;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:dp|gp/product)/([A-Z0-9]{10})").expect("valid identifier regex"));

/// Derive the catalog key for a product URL.
///
/// Only the URL path is inspected, so identifiers mentioned in the query
/// string or fragment are ignored.
///
/// # Errors
///
/// [`TrackError::IdentifierNotFound`] when the URL does not parse or its path
/// holds no identifier segment.
pub fn extract_identifier(url: &str) -> Result<ProductIdentifier, TrackError> {
    let not_found = || TrackError::IdentifierNotFound {
        url: url.to_string(),
    };

    let parsed = Url::parse(url).map_err(|_| not_found())?;
    let token = IDENTIFIER_PATTERN
        .captures(parsed.path())
        .and_then(|caps| caps.get(1))
        .ok_or_else(not_found)?;

    let identifier = ProductIdentifier::parse(token.as_str()).ok_or_else(not_found)?;
    debug!(%identifier, %url, "Extracted product identifier");
    Ok(identifier)
}
