//! Tracked targets: ticker -> target buy price, in configuration order

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{Result, WatchError};
use crate::model::normalize_ticker;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackedTargets {
    entries: Vec<(String, Decimal)>,
}

impl TrackedTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a target; a replaced ticker keeps its position
    #[must_use]
    pub fn with(mut self, ticker: &str, target: Decimal) -> Self {
        self.insert(ticker, target);
        self
    }

    pub fn insert(&mut self, ticker: &str, target: Decimal) {
        let ticker = normalize_ticker(ticker);
        match self.entries.iter_mut().find(|(t, _)| *t == ticker) {
            Some(entry) => entry.1 = target,
            None => self.entries.push((ticker, target)),
        }
    }

    /// Parse `TICKER=PRICE` pairs separated by commas or whitespace.
    ///
    /// Prices may use a decimal comma only when pairs are separated by
    /// whitespace or semicolons (`MXRF11=9,70; GARE11=8,50`).
    pub fn parse(list: &str) -> Result<Self> {
        let separators: &[char] = if list.contains(';') {
            &[';', '\n']
        } else {
            &[',', ' ', '\n', '\t']
        };

        let mut targets = Self::new();
        for pair in list.split(separators).map(str::trim).filter(|s| !s.is_empty()) {
            let (ticker, price) = pair
                .split_once('=')
                .ok_or_else(|| WatchError::Config(format!("expected TICKER=PRICE, got '{pair}'")))?;

            let ticker = ticker.trim();
            if ticker.is_empty() {
                return Err(WatchError::Config(format!("missing ticker in '{pair}'")));
            }

            let price = parse_decimal(price)
                .filter(|p| *p > Decimal::ZERO)
                .ok_or_else(|| WatchError::Config(format!("invalid target price in '{pair}'")))?;

            targets.insert(ticker, price);
        }

        if targets.is_empty() {
            return Err(WatchError::Config("no tracked targets configured".into()));
        }
        Ok(targets)
    }

    /// The personal watch list the assistant ships with
    pub fn default_funds() -> Self {
        Self::new()
            .with("KNCR11", dec!(106.00))
            .with("KNRI11", dec!(166.00))
            .with("GARE11", dec!(8.50))
            .with("MXRF11", dec!(9.70))
            .with("HGLG11", dec!(157.30))
            .with("XPML11", dec!(110.90))
            .with("XPLG11", dec!(102.20))
            .with("KNIP11", dec!(91.00))
            .with("KNHY11", dec!(99.90))
            .with("HGBS11", dec!(19.97))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.entries.iter().map(|(t, p)| (t.as_str(), *p))
    }

    pub fn get(&self, ticker: &str) -> Option<Decimal> {
        let ticker = normalize_ticker(ticker);
        self.entries.iter().find(|(t, _)| *t == ticker).map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a user-typed decimal, accepting a comma as separator ("9,74")
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    text.trim().replace(',', ".").parse::<Decimal>().ok()
}
