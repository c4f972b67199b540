//! Portfolio Reports
//!
//! Read-only aggregations over the ledger, and the chat messages built
//! from them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::{percent_of, FundRecord, DEFAULT_KIND};

/// Fixed-point rendering with exactly `places` decimals
pub fn fixed(value: Decimal, places: u32) -> String {
    let mut rounded = value.round_dp(places);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(places);
    rounded.to_string()
}

/// Monetary value with two decimals
pub fn money(value: Decimal) -> String {
    fixed(value, 2)
}

pub fn percent(value: Decimal, places: u32) -> String {
    fixed(value, places)
}

/// Explicitly signed rendering ("+12.50", "-3.10")
pub fn signed(value: Decimal, places: u32) -> String {
    let text = fixed(value, places);
    if text.starts_with('-') {
        text
    } else {
        format!("+{text}")
    }
}

/// Category badge shown next to a holding
pub fn kind_emoji(kind: &str) -> &'static str {
    match kind {
        "Brick" | "Tijolo" => "🏢",
        "Paper" | "Papel" => "📄",
        "Fof" => "📦",
        "Hybrid" | "Híbrido" => "🔄",
        "Development" | "Desenvolvimento" => "🏗️",
        _ => "💰",
    }
}

/// One held fund in a summary
#[derive(Clone, Debug, Serialize)]
pub struct HoldingLine {
    pub ticker: String,
    pub kind: String,
    pub quantity: u64,
    pub invested: Decimal,
    pub market_value: Decimal,
    pub profit: Decimal,
    pub profit_percent: Decimal,
    pub monthly_income: Decimal,
}

impl HoldingLine {
    fn from_record(record: &FundRecord) -> Self {
        let invested = record.invested();
        let market_value = record.market_value();
        let profit = market_value.saturating_sub(invested);
        let profit_percent = percent_of(profit, invested);

        Self {
            ticker: record.ticker.clone(),
            kind: display_kind(record),
            quantity: record.quantity,
            invested,
            market_value,
            profit,
            profit_percent,
            monthly_income: record.monthly_income(),
        }
    }
}

fn display_kind(record: &FundRecord) -> String {
    if record.kind.trim().is_empty() {
        DEFAULT_KIND.to_string()
    } else {
        record.kind.clone()
    }
}

/// Totals over every fund with shares held
#[derive(Clone, Debug, Default, Serialize)]
pub struct PortfolioSummary {
    /// Held funds, largest position (by quantity) first
    pub holdings: Vec<HoldingLine>,

    pub total_invested: Decimal,

    pub current_value: Decimal,

    /// Estimated monthly income from the last dividends
    pub monthly_income: Decimal,

    pub profit: Decimal,

    pub profit_percent: Decimal,

    /// Current value per category, over all records
    pub allocation: BTreeMap<String, Decimal>,

    /// Held funds whose quantity reached their magic number
    pub magic_reached: usize,
}

impl PortfolioSummary {
    pub fn from_records(records: &[FundRecord]) -> Self {
        let mut summary = Self::default();

        let mut held: Vec<&FundRecord> = records.iter().filter(|r| r.is_held()).collect();
        held.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.ticker.cmp(&b.ticker)));

        for record in held {
            let line = HoldingLine::from_record(record);
            summary.total_invested = summary.total_invested.saturating_add(line.invested);
            summary.current_value = summary.current_value.saturating_add(line.market_value);
            summary.monthly_income = summary.monthly_income.saturating_add(line.monthly_income);
            if record.reached_magic() {
                summary.magic_reached += 1;
            }
            summary.holdings.push(line);
        }

        for record in records {
            let value = summary.allocation.entry(display_kind(record)).or_default();
            *value = value.saturating_add(record.market_value());
        }

        summary.profit = summary.current_value.saturating_sub(summary.total_invested);
        summary.profit_percent = percent_of(summary.profit, summary.total_invested);
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn active_funds(&self) -> usize {
        self.holdings.len()
    }

    /// `/status` reply; `None` when nothing is held
    pub fn status_message(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut msg = String::from("📊 *PORTFOLIO SUMMARY*\n\n");
        let lines: Vec<String> = self
            .holdings
            .iter()
            .map(|h| {
                let badge = if h.profit >= Decimal::ZERO { "🟢" } else { "🔴" };
                format!(
                    "{} *{}* ({} {})\n      {} shares | Profit: R$ {} ({}%)",
                    badge,
                    h.ticker,
                    kind_emoji(&h.kind),
                    h.kind,
                    h.quantity,
                    money(h.profit),
                    percent(h.profit_percent, 1)
                )
            })
            .collect();
        msg.push_str(&lines.join("\n"));
        msg.push_str("\n\n");
        msg.push_str(&"─".repeat(15));
        msg.push('\n');
        msg.push_str(&format!("💰 *Total Invested:* R$ {}\n", money(self.total_invested)));
        msg.push_str(&format!("📈 *Current Value:* R$ {}\n", money(self.current_value)));
        msg.push_str(&format!("💵 *Result:* R$ {}\n", signed(self.profit, 2)));
        msg.push_str(&format!("💸 *Est. Monthly Income:* R$ {}", money(self.monthly_income)));
        Some(msg)
    }

    /// Closing report; `None` when nothing is held
    pub fn daily_report(&self, date: NaiveDate) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut msg = String::from("🏁 *CLOSING REPORT* 🏁\n");
        msg.push_str(&format!("📅 {}\n\n", date.format("%d/%m/%Y")));

        let lines: Vec<String> = self
            .holdings
            .iter()
            .map(|h| format!("🔹 {} ({})", h.ticker, h.kind))
            .collect();
        msg.push_str(&lines.join("\n"));
        msg.push_str("\n\n");

        msg.push_str(&format!("💵 Current Value: *R$ {}*\n", money(self.current_value)));
        msg.push_str(&format!(
            "📈 Total Result: *R$ {}* ({}%)\n",
            signed(self.profit, 2),
            signed(self.profit_percent, 2)
        ));
        msg.push_str(&format!("💸 Est. Income: *R$ {}*", money(self.monthly_income)));
        Some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fund(ticker: &str, kind: &str, quantity: u64, avg: Decimal, price: Decimal, dividend: Decimal) -> FundRecord {
        let mut record = FundRecord::new(ticker);
        record.kind = kind.into();
        record.quantity = quantity;
        record.average_cost = avg;
        record.current_price = price;
        record.last_dividend = dividend;
        record
    }

    fn sample() -> Vec<FundRecord> {
        vec![
            fund("MXRF11", "Paper", 100, dec!(9.50), dec!(10.00), dec!(0.09)),
            fund("HGLG11", "Brick", 10, dec!(160.00), dec!(150.00), dec!(1.10)),
            fund("KNRI11", "Brick", 0, dec!(0), dec!(166.00), dec!(1.00)),
        ]
    }

    #[test]
    fn test_fixed_formatting() {
        assert_eq!(money(dec!(9.5)), "9.50");
        assert_eq!(money(dec!(1234.5678)), "1234.57");
        assert_eq!(percent(dec!(1.0), 0), "1");
        assert_eq!(signed(dec!(12.5), 2), "+12.50");
        assert_eq!(signed(dec!(-3.1), 2), "-3.10");
        assert_eq!(signed(dec!(-0.001), 2), "+0.00");
    }

    #[test]
    fn test_summary_totals() {
        let summary = PortfolioSummary::from_records(&sample());

        assert_eq!(summary.active_funds(), 2);
        assert_eq!(summary.total_invested, dec!(2550.00));
        assert_eq!(summary.current_value, dec!(2500.00));
        assert_eq!(summary.monthly_income, dec!(20.00));
        assert_eq!(summary.profit, dec!(-50.00));
        assert_eq!(summary.profit_percent.round_dp(2), dec!(-1.96));

        // Largest position first
        assert_eq!(summary.holdings[0].ticker, "MXRF11");
    }

    #[test]
    fn test_allocation_by_kind() {
        let summary = PortfolioSummary::from_records(&sample());
        assert_eq!(summary.allocation.get("Paper"), Some(&dec!(1000.00)));
        assert_eq!(summary.allocation.get("Brick"), Some(&dec!(1500.00)));
    }

    #[test]
    fn test_magic_reached() {
        let mut records = sample();
        // 10.00 / 0.09 -> 112 shares needed
        records[0].quantity = 112;
        let summary = PortfolioSummary::from_records(&records);
        assert_eq!(summary.magic_reached, 1);
    }

    #[test]
    fn test_status_message() {
        let summary = PortfolioSummary::from_records(&sample());
        let msg = summary.status_message().unwrap();
        assert!(msg.contains("🟢 *MXRF11* (📄 Paper)"));
        assert!(msg.contains("100 shares | Profit: R$ 50.00 (5.3%)"));
        assert!(msg.contains("🔴 *HGLG11*"));
        assert!(msg.contains("*Result:* R$ -50.00"));
        assert!(msg.contains("*Est. Monthly Income:* R$ 20.00"));
        assert!(!msg.contains("KNRI11"));
    }

    #[test]
    fn test_daily_report() {
        let summary = PortfolioSummary::from_records(&sample());
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let msg = summary.daily_report(date).unwrap();
        assert!(msg.contains("📅 16/10/2026"));
        assert!(msg.contains("🔹 MXRF11 (Paper)"));
        assert!(msg.contains("Total Result: *R$ -50.00* (-1.96%)"));
    }

    #[test]
    fn test_empty_portfolio() {
        let summary = PortfolioSummary::from_records(&[FundRecord::new("KNRI11")]);
        assert!(summary.is_empty());
        assert!(summary.status_message().is_none());
        assert!(summary.daily_report(NaiveDate::MIN).is_none());
    }

    #[test]
    fn test_summary_survives_extreme_records() {
        let records = vec![
            fund("MXRF11", "Paper", 10, dec!(9.50), dec!(10.00), Decimal::new(1, 28)),
            fund("XPML11", "Brick", u64::MAX, Decimal::MAX, dec!(100.00), Decimal::MAX),
        ];

        let summary = PortfolioSummary::from_records(&records);
        assert_eq!(summary.active_funds(), 2);
        assert_eq!(summary.monthly_income, Decimal::MAX);
        assert_eq!(summary.total_invested, Decimal::MAX);
        assert!(summary.status_message().is_some());
        assert!(summary.daily_report(NaiveDate::default()).is_some());
        assert_eq!(summary.holdings[1].profit_percent.round_dp(2), dec!(5.26));
    }
}
