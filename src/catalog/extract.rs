use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use thiserror::Error;

static PRODUCT_SEL: LazyLock<Selector> = LazyLock::new(|| sel("article.product_pod"));
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| sel("h3 a"));
static PRICE_SEL: LazyLock<Selector> = LazyLock::new(|| sel("p.price_color"));
static RATING_SEL: LazyLock<Selector> = LazyLock::new(|| sel("p.star-rating"));
static AVAILABILITY_SEL: LazyLock<Selector> = LazyLock::new(|| sel("p.instock.availability"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rating {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl Rating {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "One" => Some(Rating::One),
            "Two" => Some(Rating::Two),
            "Three" => Some(Rating::Three),
            "Four" => Some(Rating::Four),
            "Five" => Some(Rating::Five),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::One => "One",
            Rating::Two => "Two",
            Rating::Three => "Three",
            Rating::Four => "Four",
            Rating::Five => "Five",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One product listing, fields kept as they appear on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    #[serde(rename = "Product Name")]
    pub name: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Rating")]
    pub rating: Rating,
    #[serde(rename = "Availability")]
    pub availability: String,
}

/// `item` is the 1-based position of the fragment on the page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("item {item}: no title link (h3 > a[title])")]
    MissingTitle { item: usize },
    #[error("item {item}: no price (p.price_color)")]
    MissingPrice { item: usize },
    #[error("item {item}: no rating element (p.star-rating)")]
    MissingRating { item: usize },
    #[error("item {item}: rating element has no rating class token")]
    MissingRatingToken { item: usize },
    #[error("item {item}: unknown rating {token:?}")]
    UnknownRating { item: usize, token: String },
    #[error("item {item}: no availability (p.instock.availability)")]
    MissingAvailability { item: usize },
}

/// Extract every `article.product_pod` on the page, in document order.
/// The first malformed fragment fails the whole page.
pub fn extract_items(html: &str) -> Result<Vec<CatalogItem>, ExtractionError> {
    let document = Html::parse_document(html);
    document
        .select(&PRODUCT_SEL)
        .enumerate()
        .map(|(i, fragment)| extract_item(fragment, i + 1))
        .collect()
}

pub fn extract_item(fragment: ElementRef<'_>, item: usize) -> Result<CatalogItem, ExtractionError> {
    let name = fragment
        .select(&TITLE_SEL)
        .find_map(|a| a.value().attr("title"))
        .ok_or(ExtractionError::MissingTitle { item })?
        .to_string();

    let price = fragment
        .select(&PRICE_SEL)
        .next()
        .map(element_text)
        .ok_or(ExtractionError::MissingPrice { item })?;

    let rating_el = fragment
        .select(&RATING_SEL)
        .next()
        .ok_or(ExtractionError::MissingRating { item })?;
    // class="star-rating Three": the rating word is the second token
    let token = rating_el
        .value()
        .attr("class")
        .and_then(|c| c.split_whitespace().nth(1))
        .ok_or(ExtractionError::MissingRatingToken { item })?;
    let rating = Rating::from_token(token).ok_or_else(|| ExtractionError::UnknownRating {
        item,
        token: token.to_string(),
    })?;

    let availability = fragment
        .select(&AVAILABILITY_SEL)
        .next()
        .map(element_text)
        .ok_or(ExtractionError::MissingAvailability { item })?;

    Ok(CatalogItem {
        name,
        price,
        rating,
        availability,
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    WS_RE.replace_all(raw.trim(), " ").into_owned()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(inner: &str) -> String {
        format!(
            r#"<html><body><ol><li><article class="product_pod">{}</article></li></ol></body></html>"#,
            inner
        )
    }

    const TITLE: &str = r#"<h3><a href="x.html" title="A Light in the Attic">A Light in the ...</a></h3>"#;
    const PRICE: &str = r#"<div class="product_price"><p class="price_color">£51.77</p>"#;
    const RATING: &str = r#"<p class="star-rating Three"><i class="icon-star"></i></p>"#;
    const AVAIL: &str = r#"<p class="instock availability">
        <i class="icon-ok"></i>

            In stock

    </p></div>"#;

    #[test]
    fn fixture_page() {
        let html = std::fs::read_to_string("tests/fixtures/catalog.html").unwrap();
        let items = extract_items(&html).unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].name, "A Light in the Attic");
        assert_eq!(items[0].price, "£51.77");
        assert_eq!(items[0].rating, Rating::Three);
        assert_eq!(items[0].availability, "In stock");
        assert_eq!(items[1].name, "Tipping the Velvet");
        assert_eq!(items[1].rating, Rating::One);
        assert_eq!(items[2].name, "Soumission");
        assert_eq!(items[3].name, "Sharp Objects");
        assert_eq!(items[3].rating, Rating::Four);
    }

    #[test]
    fn one_item_per_fragment_in_order() {
        let a = format!(r#"<article class="product_pod"><h3><a title="First"></a></h3>{}{}{}</article>"#, PRICE, RATING, AVAIL);
        let b = format!(
            r#"<article class="product_pod"><h3><a title="Second"></a></h3>{}<p class="star-rating Five"></p>{}</article>"#,
            PRICE, AVAIL
        );
        let html = format!("<html><body>{}{}</body></html>", a, b);
        let items = extract_items(&html).unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["First", "Second"]);
        assert_eq!(items[1].rating, Rating::Five);
    }

    #[test]
    fn empty_page() {
        assert!(extract_items("<html><body></body></html>").unwrap().is_empty());
    }

    #[test]
    fn missing_rating_token() {
        let html = pod(&format!(r#"{}{}<p class="star-rating"></p>{}"#, TITLE, PRICE, AVAIL));
        assert_eq!(
            extract_items(&html),
            Err(ExtractionError::MissingRatingToken { item: 1 })
        );
    }

    #[test]
    fn unknown_rating_word() {
        let html = pod(&format!(r#"{}{}<p class="star-rating Six"></p>{}"#, TITLE, PRICE, AVAIL));
        assert!(matches!(
            extract_items(&html),
            Err(ExtractionError::UnknownRating { item: 1, token }) if token == "Six"
        ));
    }

    #[test]
    fn missing_fields() {
        let no_title = pod(&format!(r#"<h3><a href="x.html">x</a></h3>{}{}{}"#, PRICE, RATING, AVAIL));
        assert_eq!(extract_items(&no_title), Err(ExtractionError::MissingTitle { item: 1 }));

        let no_price = pod(&format!("{}{}{}", TITLE, RATING, AVAIL));
        assert_eq!(extract_items(&no_price), Err(ExtractionError::MissingPrice { item: 1 }));

        let no_rating = pod(&format!("{}{}{}", TITLE, PRICE, AVAIL));
        assert_eq!(extract_items(&no_rating), Err(ExtractionError::MissingRating { item: 1 }));

        let no_avail = pod(&format!("{}{}{}", TITLE, PRICE, RATING));
        assert_eq!(
            extract_items(&no_avail),
            Err(ExtractionError::MissingAvailability { item: 1 })
        );
    }

    #[test]
    fn failure_reports_position_and_aborts() {
        let good = format!(r#"<article class="product_pod">{}{}{}{}</article>"#, TITLE, PRICE, RATING, AVAIL);
        let bad = format!(r#"<article class="product_pod">{}{}{}</article>"#, TITLE, PRICE, AVAIL);
        let html = format!("<html><body>{}{}{}</body></html>", good, bad, good);
        assert_eq!(extract_items(&html), Err(ExtractionError::MissingRating { item: 2 }));
    }
}
