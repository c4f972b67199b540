//! Yahoo Finance Quote Source
//!
//! Reads the last traded price of B3 listings from the public chart
//! endpoint. B3 tickers carry the `.SA` suffix on Yahoo.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::QuoteSource;
use crate::error::{Result, WatchError};
use crate::model::normalize_ticker;

const B3_SUFFIX: &str = ".SA";

/// Yahoo client configuration
#[derive(Clone, Debug)]
pub struct YahooConfig {
    /// Chart API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com/v8/finance/chart".into(),
            timeout_secs: 10,
        }
    }
}

/// Yahoo Finance price lookup
pub struct YahooQuoteSource {
    client: reqwest::Client,
    config: YahooConfig,
}

impl YahooQuoteSource {
    pub fn new(config: YahooConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) fii-watch")
            .build()?;

        Ok(Self { client, config })
    }

    /// Yahoo symbol for a B3 ticker ("MXRF11" -> "MXRF11.SA")
    fn symbol(ticker: &str) -> String {
        let ticker = normalize_ticker(ticker);
        if ticker.ends_with(B3_SUFFIX) {
            ticker
        } else {
            format!("{ticker}{B3_SUFFIX}")
        }
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteSource {
    async fn latest_price(&self, ticker: &str) -> Result<Decimal> {
        let url = format!("{}/{}", self.config.base_url, Self::symbol(ticker));

        let response = self
            .client
            .get(&url)
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WatchError::QuoteSource(format!(
                "Yahoo returned {} for {}",
                response.status(),
                ticker
            )));
        }

        let payload: ChartResponse = response.json().await?;
        payload
            .last_price()
            .ok_or_else(|| WatchError::PriceUnavailable(ticker.to_string()))
    }

    fn name(&self) -> &str {
        "Yahoo"
    }
}

// Yahoo chart API response structures
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Market price from the metadata, falling back to the last close.
    /// Prices are quoted in cents on B3, so two places are kept.
    fn last_price(&self) -> Option<Decimal> {
        let result = self.chart.result.as_ref()?.first()?;

        let from_close = || {
            result
                .indicators
                .as_ref()?
                .quote
                .first()?
                .close
                .iter()
                .rev()
                .find_map(|c| *c)
        };

        let raw = result
            .meta
            .regular_market_price
            .filter(|p| *p > 0.0)
            .or_else(from_close)?;

        Decimal::from_f64_retain(raw)
            .map(|p| p.round_dp(2))
            .filter(|p| *p > Decimal::ZERO)
    }
}
