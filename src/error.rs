//! Error taxonomy for tracking requests.
//!
//! Every failure in the scrape pipeline is terminal for the request that hit
//! it and is reported to the caller through its `Display` text. None of them
//! are retried, and all pipeline failures happen before the catalog is
//! written.

use std::fmt;
use thiserror::Error;

/// The product page field that could not be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Title,
    Price,
    Currency,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingField::Title => "title",
            MissingField::Price => "price",
            MissingField::Currency => "currency",
        };
        f.write_str(name)
    }
}

/// Everything that can go wrong while listing or tracking products.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The URL carries no `/dp/<ID>` or `/gp/product/<ID>` segment.
    #[error("could not extract a product identifier from URL: {url}")]
    IdentifierNotFound { url: String },

    /// Fetch failed, timed out, or returned a non-success status.
    #[error("failed to fetch {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The page layout no longer exposes a required field.
    #[error("failed to find {field} on product page")]
    ExtractionFailure { field: MissingField },

    #[error("failed to parse price from {text:?}")]
    PriceParse { text: String },

    /// The catalog file exists but does not hold a valid catalog.
    #[error("catalog file {path} is unreadable: {reason}")]
    PersistenceCorruption { path: String, reason: String },

    #[error("storage I/O failed for {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {reason}")]
    Config { path: String, reason: String },
}

impl TrackError {
    pub(crate) fn storage(path: impl fmt::Display, source: std::io::Error) -> Self {
        TrackError::Storage {
            path: path.to_string(),
            source,
        }
    }
}
