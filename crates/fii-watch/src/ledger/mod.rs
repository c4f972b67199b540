//! Fund Ledger
//!
//! Keyed storage of `FundRecord`s. Every mutation is a single
//! read-modify-write on one record, applied under the store's write lock,
//! so a price tick and a portfolio command touching the same ticker never
//! interleave.

mod json_file;
mod memory;

pub use json_file::JsonFileLedger;
pub use memory::MemoryLedger;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{Result, WatchError};
use crate::model::{normalize_ticker, FundRecord};

/// What `modify` does when the ticker has no record yet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IfMissing {
    /// Start from `FundRecord::new`
    Create,
    /// Fail with `FundNotFound`
    Fail,
}

/// Mutation applied to a record; an `Err` discards the whole change
pub type RecordUpdate<'a> = &'a mut (dyn FnMut(&mut FundRecord) -> Result<()> + Send);

/// Ledger storage trait
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Get a record by ticker
    async fn get(&self, ticker: &str) -> Result<Option<FundRecord>>;

    /// All records, ordered by ticker
    async fn list(&self) -> Result<Vec<FundRecord>>;

    /// Atomically read, change and write back one record.
    ///
    /// Returns the record as stored after the change.
    async fn modify(
        &self,
        ticker: &str,
        if_missing: IfMissing,
        update: RecordUpdate<'_>,
    ) -> Result<FundRecord>;
}

/// Apply an update against an in-memory map without committing it.
///
/// Shared by the stores so they agree on get-or-create and rollback rules.
fn stage_update(
    funds: &BTreeMap<String, FundRecord>,
    ticker: &str,
    if_missing: IfMissing,
    update: RecordUpdate<'_>,
) -> Result<FundRecord> {
    let key = normalize_ticker(ticker);
    let mut record = match (funds.get(&key), if_missing) {
        (Some(existing), _) => existing.clone(),
        (None, IfMissing::Create) => FundRecord::new(&key),
        (None, IfMissing::Fail) => return Err(WatchError::FundNotFound(key)),
    };

    update(&mut record)?;
    record.ticker = key;
    record.updated_at = Utc::now();
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stage_creates_missing() {
        let funds = BTreeMap::new();
        let record = stage_update(&funds, "knri11", IfMissing::Create, &mut |r| {
            r.current_price = dec!(160);
            Ok(())
        })
        .unwrap();
        assert_eq!(record.ticker, "KNRI11");
        assert_eq!(record.current_price, dec!(160));
    }

    #[test]
    fn test_stage_fails_missing() {
        let funds = BTreeMap::new();
        let result = stage_update(&funds, "KNRI11", IfMissing::Fail, &mut |_| Ok(()));
        assert!(matches!(result, Err(WatchError::FundNotFound(t)) if t == "KNRI11"));
    }
}
