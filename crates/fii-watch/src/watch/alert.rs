//! Buy-opportunity alert message

use rust_decimal::Decimal;

use crate::report::{money, percent};

/// Direction of the last price move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Down,
    Up,
    Flat,
}

impl Trend {
    pub fn from_change(change_percent: Decimal) -> Self {
        if change_percent < Decimal::ZERO {
            Self::Down
        } else if change_percent > Decimal::ZERO {
            Self::Up
        } else {
            Self::Flat
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Down => "📉",
            Self::Up => "📈",
            Self::Flat => "↔️",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpportunityAlert {
    pub ticker: String,
    pub price: Decimal,
    pub target: Decimal,
    /// How far below the target the price is, in percent
    pub margin_percent: Decimal,
    pub trend: Trend,
}

impl OpportunityAlert {
    pub fn new(ticker: &str, price: Decimal, target: Decimal, change_percent: Decimal) -> Self {
        let margin_percent = if target > Decimal::ZERO {
            (target - price) / target * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        Self {
            ticker: ticker.to_string(),
            price,
            target,
            margin_percent,
            trend: Trend::from_change(change_percent),
        }
    }

    /// Telegram Markdown rendering
    pub fn to_markdown(&self, realert_drop_percent: Decimal) -> String {
        format!(
            "🚨 *OPPORTUNITY!*\n\n\
             🏢 *{}*\n\
             💰 Price: R$ {} {}\n\
             📉 Target: R$ {}\n\
             🎯 *Margin: {}% below target*\n\
             ⚠️ _Next alert only after a further {}% drop_",
            self.ticker,
            money(self.price),
            self.trend.symbol(),
            money(self.target),
            percent(self.margin_percent, 2),
            percent(realert_drop_percent, 0),
        )
    }
}
