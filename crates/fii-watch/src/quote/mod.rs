//! Quote Sources
//!
//! Abstractions and implementations for market-data lookups.

mod mock;
mod yahoo;

pub use mock::MockQuoteSource;
pub use yahoo::{YahooConfig, YahooQuoteSource};

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{Result, WatchError};

/// Quote source trait (Strategy pattern)
///
/// A lookup either yields a usable price or fails; callers treat every
/// failure as "unavailable for now".
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Latest traded price for a ticker
    async fn latest_price(&self, ticker: &str) -> Result<Decimal>;

    /// Source name
    fn name(&self) -> &str;
}

/// Look up a price with an upper bound on how long it may take.
///
/// A timeout and a non-positive price both map to `PriceUnavailable`.
pub async fn lookup_with_timeout(
    source: &dyn QuoteSource,
    ticker: &str,
    timeout: Duration,
) -> Result<Decimal> {
    match tokio::time::timeout(timeout, source.latest_price(ticker)).await {
        Ok(Ok(price)) if price > Decimal::ZERO => Ok(price),
        Ok(Ok(_)) => Err(WatchError::PriceUnavailable(ticker.to_string())),
        Ok(Err(e)) => Err(e),
        Err(_) => {
            tracing::debug!("{} lookup for {} timed out after {:?}", source.name(), ticker, timeout);
            Err(WatchError::PriceUnavailable(ticker.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct StalledSource;

    #[async_trait]
    impl QuoteSource for StalledSource {
        async fn latest_price(&self, _ticker: &str) -> Result<Decimal> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(dec!(10))
        }

        fn name(&self) -> &str {
            "Stalled"
        }
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let result = lookup_with_timeout(&StalledSource, "KNCR11", Duration::from_millis(20)).await;
        assert!(matches!(result, Err(WatchError::PriceUnavailable(t)) if t == "KNCR11"));
    }

    #[tokio::test]
    async fn test_zero_price_is_unavailable() {
        let source = MockQuoteSource::new().with_price("GARE11", Decimal::ZERO);
        let result = lookup_with_timeout(&source, "GARE11", Duration::from_secs(1)).await;
        assert!(result.is_err());

        let source = MockQuoteSource::new().with_price("GARE11", dec!(8.40));
        let price = lookup_with_timeout(&source, "GARE11", Duration::from_secs(1)).await.unwrap();
        assert_eq!(price, dec!(8.40));
    }
}
