//! Price and currency extraction from product page markup.
//!
//! Product pages render the price in a handful of layouts, and which one a
//! given page uses drifts over time. Instead of a single locator, extraction
//! walks [`PRICE_STRATEGIES`] in priority order and keeps the first candidate
//! that starts with a recognized currency glyph.
//!
//! | Priority | Strategy | Selector |
//! |----------|----------|----------|
//! | 1 | `price-whole` | `span.a-price-whole` |
//! | 2 | `offscreen` | `span.a-offscreen` |
//! | 3 | `core-price-offscreen` | `#corePrice_feature_div .a-offscreen` |

use crate::error::{MissingField, TrackError};
use crate::models::Currency;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::str::FromStr;
use tracing::debug;

mod selectors {
    use super::*;

    pub static PRICE_WHOLE: Lazy<Selector> =
        Lazy::new(|| Selector::parse("span.a-price-whole").unwrap());

    pub static OFFSCREEN: Lazy<Selector> =
        Lazy::new(|| Selector::parse("span.a-offscreen").unwrap());

    pub static CORE_PRICE_OFFSCREEN: Lazy<Selector> =
        Lazy::new(|| Selector::parse("#corePrice_feature_div .a-offscreen").unwrap());
}

/// A probe that reads one candidate price text out of a document.
pub type PriceStrategy = fn(&Html) -> Option<String>;

/// Strategies in the order they are tried.
pub const PRICE_STRATEGIES: &[(&str, PriceStrategy)] = &[
    ("price-whole", price_whole),
    ("offscreen", offscreen),
    ("core-price-offscreen", core_price_offscreen),
];

/// Price text found by a strategy, with its currency.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCandidate {
    pub text: String,
    pub currency: Currency,
    pub strategy: &'static str,
}

fn price_whole(document: &Html) -> Option<String> {
    first_text(document, &selectors::PRICE_WHOLE)
}

fn offscreen(document: &Html) -> Option<String> {
    first_text(document, &selectors::OFFSCREEN)
}

fn core_price_offscreen(document: &Html) -> Option<String> {
    first_text(document, &selectors::CORE_PRICE_OFFSCREEN)
}

/// Stripped text of the first element matching `selector`, if non-empty.
pub(crate) fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    let element = document.select(selector).next()?;
    let text: String = element.text().map(str::trim).collect();
    (!text.is_empty()).then_some(text)
}

/// Find the displayed price using the ordered strategy list.
///
/// # Errors
///
/// - `ExtractionFailure { field: Price }` when no strategy finds any text
/// - `ExtractionFailure { field: Currency }` when text was found but none of
///   it starts with `₹` or `$`
pub fn extract_price(document: &Html) -> Result<PriceCandidate, TrackError> {
    select_price(document, PRICE_STRATEGIES)
}

pub(crate) fn select_price(
    document: &Html,
    strategies: &[(&'static str, PriceStrategy)],
) -> Result<PriceCandidate, TrackError> {
    let mut saw_text = false;

    for &(name, strategy) in strategies {
        let Some(text) = strategy(document) else {
            continue;
        };
        saw_text = true;

        match Currency::from_leading_glyph(&text) {
            Some(currency) => {
                debug!(strategy = name, %text, currency = currency.code(), "Price strategy matched");
                return Ok(PriceCandidate {
                    text,
                    currency,
                    strategy: name,
                });
            }
            None => debug!(strategy = name, %text, "Price text has no known currency glyph"),
        }
    }

    let field = if saw_text {
        MissingField::Currency
    } else {
        MissingField::Price
    };
    Err(TrackError::ExtractionFailure { field })
}

/// Parse displayed price text such as `₹1,234.50` or `$19.99`.
///
/// Thousands separators and currency glyphs are removed. A trailing decimal
/// point, as rendered by the whole-part layout (`1,234.`), is tolerated.
pub fn parse_price(text: &str) -> Result<Decimal, TrackError> {
    let cleaned: String = text
        .chars()
        .filter(|c: &char| !matches!(*c, '₹' | '$' | ','))
        .collect();
    let cleaned = cleaned.trim().trim_end_matches('.');

    Decimal::from_str(cleaned).map_err(|_| TrackError::PriceParse {
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn test_first_strategy_wins() {
        let document = doc(r#"
            <span class="a-price-whole">₹1,234.50</span>
            <span class="a-offscreen">$19.99</span>
        "#);
        let candidate = extract_price(&document).unwrap();
        assert_eq!(candidate.text, "₹1,234.50");
        assert_eq!(candidate.currency, Currency::Inr);
        assert_eq!(candidate.strategy, "price-whole");
    }

    #[test]
    fn test_glyphless_candidate_falls_through() {
        let document = doc(r#"
            <span class="a-price-whole">1,234.</span>
            <span class="a-offscreen">₹1,234.00</span>
        "#);
        let candidate = extract_price(&document).unwrap();
        assert_eq!(candidate.text, "₹1,234.00");
        assert_eq!(candidate.strategy, "offscreen");
    }

    #[test]
    fn test_core_price_strategy() {
        let document = doc(r#"
            <div id="corePrice_feature_div"><div class="a-offscreen">$19.99</div></div>
        "#);
        let candidate = extract_price(&document).unwrap();
        assert_eq!(candidate.currency, Currency::Usd);
        assert_eq!(candidate.text, "$19.99");
        assert_eq!(candidate.strategy, "core-price-offscreen");
    }

    #[test]
    fn test_only_first_element_per_selector() {
        let document = doc(r#"
            <span class="a-offscreen">  </span>
            <span class="a-offscreen">₹500</span>
        "#);
        let err = extract_price(&document).unwrap_err();
        assert!(matches!(
            err,
            TrackError::ExtractionFailure { field: MissingField::Price }
        ));
    }

    #[test]
    fn test_no_strategy_matches() {
        let document = doc("<p>Currently unavailable.</p>");
        let err = extract_price(&document).unwrap_err();
        assert!(matches!(
            err,
            TrackError::ExtractionFailure { field: MissingField::Price }
        ));
    }

    #[test]
    fn test_unrecognized_glyph() {
        let document = doc(r#"<span class="a-offscreen">€12,99</span>"#);
        let err = extract_price(&document).unwrap_err();
        assert!(matches!(
            err,
            TrackError::ExtractionFailure { field: MissingField::Currency }
        ));
    }

    #[test]
    fn test_custom_strategy_order() {
        let document = doc(r#"
            <span class="a-price-whole">₹10</span>
            <span class="a-offscreen">₹20</span>
        "#);
        let reversed: &[(&'static str, PriceStrategy)] =
            &[("offscreen", offscreen), ("price-whole", price_whole)];
        let candidate = select_price(&document, reversed).unwrap();
        assert_eq!(candidate.text, "₹20");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("₹1,234.50").unwrap(), Decimal::new(123450, 2));
        assert_eq!(parse_price("$19.99").unwrap(), Decimal::new(1999, 2));
        assert_eq!(parse_price("₹1,234.").unwrap(), Decimal::new(1234, 0));
        assert_eq!(parse_price("₹ 2,49,999").unwrap(), Decimal::new(249999, 0));
    }

    #[test]
    fn test_parse_price_rejects_non_numeric() {
        for text in ["₹", "$abc", "₹12-15", ""] {
            let err = parse_price(text).unwrap_err();
            assert!(matches!(err, TrackError::PriceParse { .. }), "{text:?}");
        }
    }
}
