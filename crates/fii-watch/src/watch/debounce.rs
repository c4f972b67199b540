//! Alert debounce state
//!
//! Remembers, per ticker, the price at which the last opportunity alert
//! went out to one chat. `PriceWatcher` keeps one per destination for as
//! long as it lives; never persisted.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::normalize_ticker;

/// Default drop, in percent, required before re-alerting
pub const DEFAULT_REALERT_DROP_PERCENT: Decimal = dec!(1.0);

#[derive(Debug)]
pub struct AlertDebounce {
    last_alert: HashMap<String, Decimal>,
    realert_drop_percent: Decimal,
}

impl Default for AlertDebounce {
    fn default() -> Self {
        Self::new(DEFAULT_REALERT_DROP_PERCENT)
    }
}

impl AlertDebounce {
    pub fn new(realert_drop_percent: Decimal) -> Self {
        Self {
            last_alert: HashMap::new(),
            realert_drop_percent: realert_drop_percent.abs(),
        }
    }

    pub fn last_alert(&self, ticker: &str) -> Option<Decimal> {
        self.last_alert.get(&normalize_ticker(ticker)).copied()
    }

    /// Percent change of `price` against the last alerted price
    pub fn change_since_alert(&self, ticker: &str, price: Decimal) -> Option<Decimal> {
        self.last_alert(ticker)
            .filter(|last| *last > Decimal::ZERO)
            .map(|last| (price / last - Decimal::ONE) * Decimal::ONE_HUNDRED)
    }

    /// First qualification always alerts; afterwards only a further drop
    /// of at least the configured percentage does.
    pub fn should_alert(&self, ticker: &str, price: Decimal) -> bool {
        match self.change_since_alert(ticker, price) {
            None => true,
            Some(change) => change <= -self.realert_drop_percent,
        }
    }

    pub fn record(&mut self, ticker: &str, price: Decimal) {
        self.last_alert.insert(normalize_ticker(ticker), price);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_alert_always_fires() {
        let debounce = AlertDebounce::default();
        assert_eq!(debounce.last_alert("HGLG11"), None);
        assert!(debounce.should_alert("HGLG11", dec!(150)));
    }

    #[test]
    fn test_small_drop_is_suppressed() {
        let mut debounce = AlertDebounce::default();
        debounce.record("AAA11", dec!(99.00));

        // 0.10% drop
        assert!(!debounce.should_alert("AAA11", dec!(98.90)));
        // 1.11% drop
        assert!(debounce.should_alert("AAA11", dec!(97.90)));

        debounce.record("AAA11", dec!(97.90));
        assert_eq!(debounce.last_alert("aaa11"), Some(dec!(97.90)));
    }

    #[test]
    fn test_rise_is_suppressed() {
        let mut debounce = AlertDebounce::default();
        debounce.record("AAA11", dec!(95.00));
        assert!(!debounce.should_alert("AAA11", dec!(95.00)));
        assert!(!debounce.should_alert("AAA11", dec!(96.00)));
    }

    #[test]
    fn test_exact_threshold_alerts() {
        let mut debounce = AlertDebounce::default();
        debounce.record("AAA11", dec!(100));
        assert!(debounce.should_alert("AAA11", dec!(99)));
    }

    #[test]
    fn test_custom_threshold() {
        let mut debounce = AlertDebounce::new(dec!(5));
        debounce.record("AAA11", dec!(100));
        assert!(!debounce.should_alert("AAA11", dec!(96)));
        assert!(debounce.should_alert("AAA11", dec!(95)));
    }
}
