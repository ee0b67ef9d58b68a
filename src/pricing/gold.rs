// Custodian gold prices scraped from bank gram-gold pages
//
// Each custodian maps to a page showing its gram-gold bid price in Turkish
// number format ("5.123,45"). Page layouts drift, so extraction walks a list
// of known selectors and finally scans every span for something that looks
// like a plausible price.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::{PriceSource, RateGate};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Selectors tried in order before falling back to a full span scan
const PRICE_SELECTORS: &[&str] = &[
    r#"span[data-socket-attr="bid"]"#,
    "span.value",
    "div.value",
];

static TURKISH_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(?:\.\d{3})*,\d+$|^\d+,\d+$").unwrap());

/// Exclusive range a scraped gram price must fall in to be trusted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBounds {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceBounds {
    pub fn contains(&self, price: Decimal) -> bool {
        price > self.min && price < self.max
    }
}

/// Parse a Turkish-formatted number: `.` groups thousands, `,` marks decimals
pub fn parse_turkish_number(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if !TURKISH_NUMBER.is_match(text) {
        return None;
    }
    Decimal::from_str(&text.replace('.', "").replace(',', ".")).ok()
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join("").trim().to_string()
}

/// Find the bid price on a custodian page.
///
/// Returns `None` when nothing on the page parses to a price inside
/// `bounds`.
pub fn extract_bid_price(html: &str, bounds: &PriceBounds) -> Option<Decimal> {
    let document = Html::parse_document(html);

    for raw_selector in PRICE_SELECTORS {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        let Some(element) = document.select(&selector).next() else {
            continue;
        };
        let text = element_text(element);
        match parse_turkish_number(&text) {
            Some(price) if bounds.contains(price) => {
                debug!("Gold price {} found via {}", price, raw_selector);
                return Some(price);
            }
            Some(price) => {
                debug!("Rejecting out-of-range value {} from {}", price, raw_selector);
            }
            None => {
                debug!("Unparseable text '{}' from {}", text, raw_selector);
            }
        }
    }

    let span_selector = Selector::parse("span").ok()?;
    document
        .select(&span_selector)
        .map(element_text)
        .filter_map(|text| parse_turkish_number(&text))
        .find(|price| bounds.contains(*price))
}

/// Gold price adapter resolving a custodian name to its gram-gold bid price
pub struct CustodianGoldPrices {
    client: Client,
    pages: HashMap<String, String>,
    bounds: PriceBounds,
    gate: RateGate,
}

impl CustodianGoldPrices {
    pub fn new(
        pages: HashMap<String, String>,
        bounds: PriceBounds,
        min_interval: Duration,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build gold price HTTP client")?;

        let gate = RateGate::new(min_interval);
        debug!(
            "Gold price source for {} custodians, {}ms between requests",
            pages.len(),
            gate.min_interval().as_millis()
        );

        Ok(Self {
            client,
            pages,
            bounds,
            gate,
        })
    }

    fn fetch_page(&self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .send()
            .context("Failed to request custodian gold page")?
            .error_for_status()
            .context("Custodian gold page returned error status")?
            .text()
            .context("Failed to read custodian gold page")
    }
}

impl PriceSource for CustodianGoldPrices {
    fn fetch_price(&self, identifier: &str) -> Result<Option<Decimal>> {
        let url = self
            .pages
            .get(identifier.trim())
            .ok_or_else(|| anyhow!("no gold price page configured for custodian"))?;

        self.gate.wait();
        info!("Fetching {} gold price from {}", identifier, url);

        let html = self.fetch_page(url)?;
        let price = extract_bid_price(&html, &self.bounds).ok_or_else(|| {
            anyhow!(
                "no price between {} and {} found on page",
                self.bounds.min,
                self.bounds.max
            )
        })?;

        info!("{}: {} TL", identifier, price);
        Ok(Some(price))
    }
}
