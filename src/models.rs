//! Data models for tracked products and their price histories.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ProductIdentifier`]: the 10-character catalog key taken from a product URL
//! - [`PriceObservation`]: one timestamped price, always in INR
//! - [`ProductRecord`]: descriptive fields plus the append-only history
//! - [`ProductCatalog`]: the persisted mapping from identifier to record
//! - [`RawExtraction`] and [`ProductRecordDelta`]: ephemeral scrape results
//!
//! The persisted field names (`imageUrl`, `lastPriceINR`, `priceHistory`,
//! `price_inr`) are fixed by the catalog file format, hence the explicit
//! `#[serde(rename)]` attributes.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Persisted mapping from product identifier to its record.
pub type ProductCatalog = BTreeMap<ProductIdentifier, ProductRecord>;

/// Length of a product identifier.
pub const IDENTIFIER_LEN: usize = 10;

/// A marketplace product identifier such as `B00TEST123`.
///
/// Always exactly [`IDENTIFIER_LEN`] characters of `A-Z` and `0-9`. Catalog
/// keys are validated on load, so a key that breaks this rule makes the
/// catalog file unreadable rather than slipping into memory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductIdentifier(String);

impl ProductIdentifier {
    /// Validate a candidate token.
    pub fn parse(token: &str) -> Option<Self> {
        let valid = token.len() == IDENTIFIER_LEN
            && token
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        valid.then(|| ProductIdentifier(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProductIdentifier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ProductIdentifier::parse(&value).ok_or_else(|| format!("invalid product identifier {value:?}"))
    }
}

impl From<ProductIdentifier> for String {
    fn from(id: ProductIdentifier) -> Self {
        id.0
    }
}

impl fmt::Display for ProductIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Currency detected from the leading glyph of a displayed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    /// Indian rupee, the reference currency every stored price is in.
    Inr,
    /// US dollar, converted with the live or fallback USD→INR rate.
    Usd,
}

impl Currency {
    /// Recognize the currency from the first character of `text`.
    pub fn from_leading_glyph(text: &str) -> Option<Self> {
        match text.chars().next()? {
            '₹' => Some(Currency::Inr),
            '$' => Some(Currency::Usd),
            _ => None,
        }
    }

    pub fn is_reference(self) -> bool {
        self == Currency::Inr
    }

    pub fn code(self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
        }
    }
}

/// A single price sighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Local wall-clock time of the scrape.
    pub timestamp: NaiveDateTime,
    /// Price in INR.
    #[serde(rename = "price_inr", with = "amount")]
    pub price: Decimal,
}

/// Everything the catalog knows about one product.
///
/// `name`, `image_url` and `source_url` are set once when the product is
/// first tracked. The price fields only change through [`ProductRecord::record`],
/// which keeps `last_price` equal to the newest observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(rename = "lastPriceINR", with = "amount")]
    last_price: Decimal,
    #[serde(rename = "priceHistory")]
    history: Vec<PriceObservation>,
}

impl ProductRecord {
    /// Build the record for a product seen for the first time.
    pub fn from_delta(delta: ProductRecordDelta) -> Self {
        ProductRecord {
            name: delta.title,
            image_url: delta.image_url,
            source_url: delta.source_url,
            last_price: delta.observation.price,
            history: vec![delta.observation],
        }
    }

    /// Append an observation and make it the current price.
    pub fn record(&mut self, observation: PriceObservation) {
        self.last_price = observation.price;
        self.history.push(observation);
    }

    pub fn last_price(&self) -> Decimal {
        self.last_price
    }

    pub fn history(&self) -> &[PriceObservation] {
        &self.history
    }
}

/// Fields pulled out of a product page before normalization.
///
/// Lives only for the duration of one scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExtraction {
    pub title: String,
    pub price_text: String,
    pub currency: Currency,
    pub image_url: String,
}

/// The result of one successful scrape, not yet merged into the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecordDelta {
    pub identifier: ProductIdentifier,
    pub title: String,
    pub image_url: String,
    pub source_url: String,
    pub observation: PriceObservation,
}

/// Decimal amounts are stored as plain JSON numbers.
mod amount {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        let float = value
            .to_f64()
            .ok_or_else(|| <S::Error as serde::ser::Error>::custom(format!("amount {value} out of range")))?;
        serializer.serialize_f64(float)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let float = f64::deserialize(deserializer)?;
        if !float.is_finite() {
            return Err(D::Error::custom("amount is not finite"));
        }
        // Display gives the shortest text that round-trips, so 1669.17 stays 1669.17.
        Decimal::from_str(&float.to_string()).map_err(D::Error::custom)
    }
}
