//! Portfolio mutations
//!
//! Buy, sell and dividend bookkeeping over the shared ledger. Each
//! operation is one atomic `modify`, so it never interleaves with a price
//! tick on the same ticker.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::error::{Result, WatchError};
use crate::ledger::{IfMissing, LedgerStore};
use crate::model::{normalize_kind, FundRecord};
use crate::report::PortfolioSummary;

pub struct Portfolio {
    ledger: Arc<dyn LedgerStore>,
}

impl Portfolio {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Add shares, recomputing the weighted average cost.
    ///
    /// `kind` replaces the stored category when given.
    pub async fn record_buy(
        &self,
        ticker: &str,
        quantity: u64,
        price: Decimal,
        kind: Option<&str>,
    ) -> Result<FundRecord> {
        if quantity == 0 {
            return Err(WatchError::InvalidAmount {
                field: "quantity",
                value: Decimal::ZERO,
            });
        }
        if price <= Decimal::ZERO {
            return Err(WatchError::InvalidAmount { field: "price", value: price });
        }

        let kind = kind.map(normalize_kind);
        let record = self
            .ledger
            .modify(ticker, IfMissing::Create, &mut |record| {
                let held = Decimal::from(record.quantity);
                let bought = Decimal::from(quantity);
                let new_quantity = record
                    .quantity
                    .checked_add(quantity)
                    .ok_or(WatchError::InvalidAmount {
                        field: "quantity",
                        value: bought,
                    })?;

                record.average_cost = held
                    .checked_mul(record.average_cost)
                    .zip(bought.checked_mul(price))
                    .and_then(|(before, added)| before.checked_add(added))
                    .and_then(|total| total.checked_div(Decimal::from(new_quantity)))
                    .ok_or(WatchError::InvalidAmount { field: "price", value: price })?;
                record.quantity = new_quantity;
                if let Some(kind) = &kind {
                    record.kind.clone_from(kind);
                }
                Ok(())
            })
            .await?;

        tracing::info!(
            "Bought {} {} at R$ {}: now {} shares, average R$ {}",
            quantity,
            record.ticker,
            price,
            record.quantity,
            record.average_cost.round_dp(2)
        );
        Ok(record)
    }

    /// Remove shares; the average cost is left as is.
    pub async fn record_sell(&self, ticker: &str, quantity: u64) -> Result<FundRecord> {
        if quantity == 0 {
            return Err(WatchError::InvalidAmount {
                field: "quantity",
                value: Decimal::ZERO,
            });
        }

        let record = self
            .ledger
            .modify(ticker, IfMissing::Fail, &mut |record| {
                if quantity > record.quantity {
                    return Err(WatchError::InsufficientHoldings {
                        ticker: record.ticker.clone(),
                        requested: quantity,
                        held: record.quantity,
                    });
                }
                record.quantity -= quantity;
                Ok(())
            })
            .await?;

        tracing::info!("Sold {} {}: {} shares left", quantity, record.ticker, record.quantity);
        Ok(record)
    }

    /// Set the most recent per-share dividend
    pub async fn record_dividend(&self, ticker: &str, amount: Decimal) -> Result<FundRecord> {
        if amount < Decimal::ZERO {
            return Err(WatchError::InvalidAmount { field: "dividend", value: amount });
        }

        let record = self
            .ledger
            .modify(ticker, IfMissing::Fail, &mut |record| {
                record.last_dividend = amount;
                Ok(())
            })
            .await?;

        tracing::info!("Dividend of {} set to R$ {}", record.ticker, amount);
        Ok(record)
    }

    /// Set the net asset value per share used for P/VP
    pub async fn record_book_value(&self, ticker: &str, amount: Decimal) -> Result<FundRecord> {
        if amount <= Decimal::ZERO {
            return Err(WatchError::InvalidAmount { field: "book value", value: amount });
        }

        self.ledger
            .modify(ticker, IfMissing::Fail, &mut |record| {
                record.book_value = amount;
                Ok(())
            })
            .await
    }

    /// All records, for reporting
    pub async fn records(&self) -> Result<Vec<FundRecord>> {
        self.ledger.list().await
    }

    pub async fn summary(&self) -> Result<PortfolioSummary> {
        let records = self.ledger.list().await?;
        Ok(PortfolioSummary::from_records(&records))
    }
}
