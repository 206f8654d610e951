//! Title and image extraction from product page markup.

use super::price::first_text;
use crate::error::{MissingField, TrackError};
use crate::models::ProductIdentifier;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("#productTitle").unwrap());

static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("#imgTagWrapperId img").unwrap());

/// Placeholder image used when the page has no main product image.
pub fn placeholder_image_url(identifier: &ProductIdentifier) -> String {
    format!(
        "https://placehold.co/200x200/ffffff/111827?text={}",
        urlencoding::encode(identifier.as_str())
    )
}

/// Extract the product title and main image URL.
///
/// A missing title fails the scrape; a missing image never does and is
/// replaced by [`placeholder_image_url`].
pub fn extract_product(
    document: &Html,
    identifier: &ProductIdentifier,
) -> Result<(String, String), TrackError> {
    let title = first_text(document, &TITLE).ok_or(TrackError::ExtractionFailure {
        field: MissingField::Title,
    })?;

    let image_url = document
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| placeholder_image_url(identifier));

    Ok((title, image_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> ProductIdentifier {
        ProductIdentifier::parse("B00TEST123").unwrap()
    }

    #[test]
    fn test_title_and_image() {
        let document = Html::parse_document(
            r#"<span id="productTitle">
                   Stainless Steel Kettle, 1.5 L
               </span>
               <div id="imgTagWrapperId"><img src="https://m.media.example.com/k.jpg"></div>"#,
        );
        let (title, image) = extract_product(&document, &id()).unwrap();
        assert_eq!(title, "Stainless Steel Kettle, 1.5 L");
        assert_eq!(image, "https://m.media.example.com/k.jpg");
    }

    #[test]
    fn test_missing_image_uses_placeholder() {
        let document = Html::parse_document(
            r#"<span id="productTitle">Kettle</span>
               <div id="imgTagWrapperId"><img alt="no source"></div>"#,
        );
        let (_, image) = extract_product(&document, &id()).unwrap();
        assert_eq!(
            image,
            "https://placehold.co/200x200/ffffff/111827?text=B00TEST123"
        );
    }

    #[test]
    fn test_missing_title_fails() {
        let document = Html::parse_document(r#"<span id="productTitle">   </span>"#);
        let err = extract_product(&document, &id()).unwrap_err();
        assert!(matches!(
            err,
            TrackError::ExtractionFailure { field: MissingField::Title }
        ));
    }
}
