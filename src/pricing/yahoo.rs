use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{PriceSource, RateGate};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart response
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

/// Equity price adapter backed by the Yahoo Finance chart API.
///
/// Resolves a Borsa Istanbul ticker (`AKBNK`) to its most recent daily
/// close over the last five trading days.
pub struct YahooEquityPrices {
    client: Client,
    base_url: String,
    exchange_suffix: String,
    gate: RateGate,
}

impl YahooEquityPrices {
    pub fn new(exchange_suffix: &str, min_interval: Duration, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; GoldfolioBot/1.0)")
            .timeout(timeout)
            .build()
            .context("Failed to build Yahoo Finance HTTP client")?;

        let gate = RateGate::new(min_interval);
        debug!(
            "Yahoo price source for *{}, {}ms between requests",
            exchange_suffix,
            gate.min_interval().as_millis()
        );

        Ok(Self {
            client,
            base_url: CHART_URL.to_string(),
            exchange_suffix: exchange_suffix.to_string(),
            gate,
        })
    }

    fn symbol(&self, ticker: &str) -> String {
        format!("{}{}", ticker.trim().to_uppercase(), self.exchange_suffix)
    }

    fn fetch_latest_close(&self, ticker: &str) -> Result<Option<Decimal>> {
        let symbol = self.symbol(ticker);
        info!("Fetching latest close for {} from Yahoo Finance", symbol);

        let url = format!("{}/{}?range=5d&interval=1d", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .send()
            .context("Failed to send request to Yahoo Finance")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Yahoo Finance returned error status: {}",
                response.status()
            ));
        }

        let body = response
            .text()
            .context("Failed to read Yahoo Finance response")?;
        parse_latest_close(&body)
    }
}

impl PriceSource for YahooEquityPrices {
    fn fetch_price(&self, identifier: &str) -> Result<Option<Decimal>> {
        self.gate.wait();
        self.fetch_latest_close(identifier)
    }
}

/// Extract the most recent non-null daily close from a chart payload,
/// rounded to 2 decimal places. `Ok(None)` when there is no trading history.
pub fn parse_latest_close(body: &str) -> Result<Option<Decimal>> {
    let data: YahooChartResponse =
        serde_json::from_str(body).context("Failed to parse Yahoo Finance response")?;

    if let Some(error) = data.chart.error {
        return Err(anyhow!(
            "Yahoo Finance API error: {} - {}",
            error.code,
            error.description
        ));
    }

    let closes = data
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .and_then(|r| r.indicators.quote.into_iter().next())
        .and_then(|q| q.close)
        .unwrap_or_default();

    let latest = closes.iter().rev().find_map(|c| *c);
    debug!("Yahoo returned {} closes, latest {:?}", closes.len(), latest);

    match latest {
        Some(close) => {
            let price = Decimal::from_f64_retain(close)
                .ok_or_else(|| anyhow!("Invalid close price value: {}", close))?;
            Ok(Some(
                price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            ))
        }
        None => Ok(None),
    }
}
