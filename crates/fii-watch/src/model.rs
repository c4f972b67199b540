//! Domain Models
//!
//! The persisted fund record and the metrics derived from it.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Category used when a fund was never classified
pub const DEFAULT_KIND: &str = "Brick";

/// Normalize a user-typed ticker ("mxrf11 " -> "MXRF11")
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Normalize a fund category the way it is displayed ("paper" -> "Paper")
pub fn normalize_kind(kind: &str) -> String {
    let kind = kind.trim();
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => DEFAULT_KIND.to_string(),
    }
}

/// One tracked or held real-estate fund
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundRecord {
    /// Ticker symbol (e.g., "HGLG11"), always uppercase
    pub ticker: String,

    /// Last observed price; zero means never observed
    pub current_price: Decimal,

    /// Configured ceiling price for the buy signal
    pub target_price: Decimal,

    /// Signed percentage change against the previously observed price
    pub change_percent: Decimal,

    /// Shares held
    pub quantity: u64,

    /// Quantity-weighted average purchase price
    pub average_cost: Decimal,

    /// Most recently reported per-share dividend
    pub last_dividend: Decimal,

    /// Net asset value per share, used for P/VP
    #[serde(default = "default_book_value")]
    pub book_value: Decimal,

    /// Free-text category (Brick, Paper, Fof, ...)
    pub kind: String,

    /// Last write
    pub updated_at: DateTime<Utc>,
}

const fn default_book_value() -> Decimal {
    Decimal::ONE
}

impl FundRecord {
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: normalize_ticker(ticker),
            current_price: Decimal::ZERO,
            target_price: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            quantity: 0,
            average_cost: Decimal::ZERO,
            last_dividend: Decimal::ZERO,
            book_value: default_book_value(),
            kind: DEFAULT_KIND.to_string(),
            updated_at: Utc::now(),
        }
    }

    pub const fn is_held(&self) -> bool {
        self.quantity > 0
    }

    fn quantity_decimal(&self) -> Decimal {
        Decimal::from(self.quantity)
    }

    /// Amount paid for the current holding
    pub fn invested(&self) -> Decimal {
        self.quantity_decimal().saturating_mul(self.average_cost)
    }

    /// Holding valued at the last observed price
    pub fn market_value(&self) -> Decimal {
        self.quantity_decimal().saturating_mul(self.current_price)
    }

    /// Estimated monthly income from the last dividend
    pub fn monthly_income(&self) -> Decimal {
        self.quantity_decimal().saturating_mul(self.last_dividend)
    }

    /// Unrealized profit of the holding
    pub fn profit(&self) -> Decimal {
        if self.is_held() {
            (self.current_price - self.average_cost).saturating_mul(self.quantity_decimal())
        } else {
            Decimal::ZERO
        }
    }

    pub fn profit_percent(&self) -> Decimal {
        percent_of(self.profit(), self.invested())
    }

    /// Last dividend over current price, in percent
    pub fn dividend_yield(&self) -> Decimal {
        percent_of(self.last_dividend, self.current_price)
    }

    /// How far above the target the price is (zero when at or below)
    pub fn distance_to_target(&self) -> Decimal {
        if self.current_price > self.target_price {
            self.current_price - self.target_price
        } else {
            Decimal::ZERO
        }
    }

    pub fn price_to_book(&self) -> Decimal {
        if self.book_value > Decimal::ZERO {
            self.current_price.checked_div(self.book_value).unwrap_or_default()
        } else {
            Decimal::ZERO
        }
    }

    /// Shares needed for one monthly dividend to buy a new share
    pub fn magic_number(&self) -> u64 {
        if self.last_dividend > Decimal::ZERO && self.current_price > Decimal::ZERO {
            self.current_price
                .checked_div(self.last_dividend)
                .and_then(|ratio| ratio.ceil().to_u64())
                .unwrap_or(u64::MAX)
        } else {
            0
        }
    }

    pub fn shares_to_magic(&self) -> u64 {
        self.magic_number().saturating_sub(self.quantity)
    }

    pub fn reached_magic(&self) -> bool {
        let magic = self.magic_number();
        magic > 0 && self.quantity >= magic
    }

    /// Progress towards the magic number, capped at 100
    pub fn magic_progress(&self) -> Decimal {
        let magic = self.magic_number();
        if magic == 0 {
            return Decimal::ZERO;
        }
        percent_of(self.quantity_decimal(), Decimal::from(magic)).min(Decimal::ONE_HUNDRED)
    }
}

/// `part` as a percentage of `whole`. Zero when `whole` is not positive
/// or the result does not fit a `Decimal`.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn held(quantity: u64, average_cost: Decimal, price: Decimal) -> FundRecord {
        let mut record = FundRecord::new("mxrf11");
        record.quantity = quantity;
        record.average_cost = average_cost;
        record.current_price = price;
        record
    }

    #[test]
    fn test_new_record_defaults() {
        let record = FundRecord::new(" hglg11 ");
        assert_eq!(record.ticker, "HGLG11");
        assert_eq!(record.kind, DEFAULT_KIND);
        assert_eq!(record.current_price, Decimal::ZERO);
        assert_eq!(record.book_value, Decimal::ONE);
        assert!(!record.is_held());
    }

    #[test]
    fn test_normalize_kind() {
        assert_eq!(normalize_kind("paper"), "Paper");
        assert_eq!(normalize_kind("FOF"), "Fof");
        assert_eq!(normalize_kind("  "), DEFAULT_KIND);
    }

    #[test]
    fn test_profit_and_totals() {
        let record = held(10, dec!(9.50), dec!(10.00));
        assert_eq!(record.invested(), dec!(95.00));
        assert_eq!(record.market_value(), dec!(100.00));
        assert_eq!(record.profit(), dec!(5.00));
        assert_eq!(record.profit_percent().round_dp(2), dec!(5.26));
    }

    #[test]
    fn test_distance_to_target() {
        let mut record = held(0, Decimal::ZERO, dec!(105));
        record.target_price = dec!(100);
        assert_eq!(record.distance_to_target(), dec!(5));

        record.current_price = dec!(95);
        assert_eq!(record.distance_to_target(), Decimal::ZERO);
    }

    #[test]
    fn test_magic_number() {
        let mut record = held(50, dec!(9.80), dec!(10.00));
        record.last_dividend = dec!(0.09);
        // 10.00 / 0.09 = 111.1 -> 112 shares
        assert_eq!(record.magic_number(), 112);
        assert_eq!(record.shares_to_magic(), 62);
        assert!(!record.reached_magic());

        record.quantity = 200;
        assert!(record.reached_magic());
        assert_eq!(record.magic_progress(), dec!(100));
        assert_eq!(record.shares_to_magic(), 0);
    }

    #[test]
    fn test_ratios_without_price() {
        let record = FundRecord::new("KNRI11");
        assert_eq!(record.dividend_yield(), Decimal::ZERO);
        assert_eq!(record.magic_number(), 0);
        assert_eq!(record.magic_progress(), Decimal::ZERO);
        assert_eq!(record.price_to_book(), Decimal::ZERO);
    }

    #[test]
    fn test_extreme_amounts_do_not_overflow() {
        let mut record = held(10, dec!(9.50), dec!(10.00));
        record.last_dividend = Decimal::new(1, 28);
        record.book_value = Decimal::new(1, 28);
        assert_eq!(record.magic_number(), u64::MAX);
        assert_eq!(record.price_to_book(), Decimal::ZERO);
        assert!(record.magic_progress() < Decimal::ONE);

        record.last_dividend = Decimal::MAX;
        record.current_price = Decimal::new(1, 28);
        assert_eq!(record.dividend_yield(), Decimal::ZERO);
        assert_eq!(record.monthly_income(), Decimal::MAX);
    }
}
