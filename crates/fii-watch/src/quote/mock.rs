//! Mock Quote Source
//!
//! For testing and demo purposes. Serves scripted prices per ticker.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::QuoteSource;
use crate::error::{Result, WatchError};
use crate::model::normalize_ticker;

/// Scripted quote source
///
/// Each ticker holds a queue of prices; a lookup pops the front until one
/// price remains, which is then repeated. `None` entries simulate an
/// unavailable lookup.
#[derive(Default)]
pub struct MockQuoteSource {
    scripts: Mutex<HashMap<String, VecDeque<Option<Decimal>>>>,
}

impl MockQuoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a fixed price for a ticker
    #[must_use]
    pub fn with_price(self, ticker: &str, price: Decimal) -> Self {
        self.push(ticker, Some(price));
        self
    }

    /// Serve a sequence of lookups for a ticker
    #[must_use]
    pub fn with_sequence(self, ticker: &str, prices: &[Option<Decimal>]) -> Self {
        for price in prices {
            self.push(ticker, *price);
        }
        self
    }

    /// Queue one more lookup result for a ticker
    pub fn push(&self, ticker: &str, price: Option<Decimal>) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts
                .entry(normalize_ticker(ticker))
                .or_default()
                .push_back(price);
        }
    }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    async fn latest_price(&self, ticker: &str) -> Result<Decimal> {
        let mut scripts = self
            .scripts
            .lock()
            .map_err(|_| WatchError::QuoteSource("mock script poisoned".into()))?;

        let queue = scripts
            .get_mut(&normalize_ticker(ticker))
            .ok_or_else(|| WatchError::PriceUnavailable(ticker.to_string()))?;

        let next = if queue.len() > 1 {
            queue.pop_front().flatten()
        } else {
            queue.front().copied().flatten()
        };

        next.ok_or_else(|| WatchError::PriceUnavailable(ticker.to_string()))
    }

    fn name(&self) -> &str {
        "MockQuotes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_sequence_then_repeat() {
        let quotes = MockQuoteSource::new()
            .with_sequence("aaa11", &[Some(dec!(95)), None, Some(dec!(94))]);

        assert_eq!(quotes.latest_price("AAA11").await.unwrap(), dec!(95));
        assert!(quotes.latest_price("AAA11").await.is_err());
        assert_eq!(quotes.latest_price("AAA11").await.unwrap(), dec!(94));
        assert_eq!(quotes.latest_price("AAA11").await.unwrap(), dec!(94));
    }

    #[tokio::test]
    async fn test_unknown_ticker() {
        let quotes = MockQuoteSource::new();
        let result = quotes.latest_price("NOTREAL11").await;
        assert!(matches!(result, Err(WatchError::PriceUnavailable(_))));
    }
}
