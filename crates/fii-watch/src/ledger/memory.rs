//! In-memory ledger (for development and tests)

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{stage_update, IfMissing, LedgerStore, RecordUpdate};
use crate::error::Result;
use crate::model::{normalize_ticker, FundRecord};

pub struct MemoryLedger {
    funds: RwLock<BTreeMap<String, FundRecord>>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            funds: RwLock::new(BTreeMap::new()),
        }
    }

    /// Seed with existing records
    pub fn with_records(records: impl IntoIterator<Item = FundRecord>) -> Self {
        let funds = records
            .into_iter()
            .map(|r| (normalize_ticker(&r.ticker), r))
            .collect();
        Self {
            funds: RwLock::new(funds),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn get(&self, ticker: &str) -> Result<Option<FundRecord>> {
        let funds = self.funds.read().await;
        Ok(funds.get(&normalize_ticker(ticker)).cloned())
    }

    async fn list(&self) -> Result<Vec<FundRecord>> {
        let funds = self.funds.read().await;
        Ok(funds.values().cloned().collect())
    }

    async fn modify(
        &self,
        ticker: &str,
        if_missing: IfMissing,
        update: RecordUpdate<'_>,
    ) -> Result<FundRecord> {
        let mut funds = self.funds.write().await;
        let record = stage_update(&funds, ticker, if_missing, update)?;
        funds.insert(record.ticker.clone(), record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WatchError;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_failed_update_leaves_record() {
        let ledger = MemoryLedger::new();
        ledger
            .modify("XPML11", IfMissing::Create, &mut |r| {
                r.quantity = 5;
                Ok(())
            })
            .await
            .unwrap();

        let result = ledger
            .modify("XPML11", IfMissing::Fail, &mut |r| {
                r.quantity = 0;
                Err(WatchError::Storage("boom".into()))
            })
            .await;
        assert!(result.is_err());

        let record = ledger.get("xpml11").await.unwrap().unwrap();
        assert_eq!(record.quantity, 5);
    }

    #[tokio::test]
    async fn test_concurrent_modifications_do_not_interleave() {
        let ledger = Arc::new(MemoryLedger::new());

        let mut handles = Vec::new();
        for _ in 0..50 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .modify("HGBS11", IfMissing::Create, &mut |r| {
                        r.quantity += 1;
                        r.current_price += dec!(0.01);
                        Ok(())
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = ledger.get("HGBS11").await.unwrap().unwrap();
        assert_eq!(record.quantity, 50);
        assert_eq!(record.current_price, dec!(0.50));
    }

    #[tokio::test]
    async fn test_list_is_ordered() {
        let ledger = MemoryLedger::with_records([FundRecord::new("XPLG11"), FundRecord::new("GARE11")]);
        let tickers: Vec<_> = ledger.list().await.unwrap().into_iter().map(|r| r.ticker).collect();
        assert_eq!(tickers, vec!["GARE11", "XPLG11"]);
    }
}
