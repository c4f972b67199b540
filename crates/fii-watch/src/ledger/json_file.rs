//! JSON file ledger
//!
//! Keeps the records in memory and rewrites the whole document on every
//! mutation (temp file + rename), so the file is always a complete
//! snapshot that survives restarts.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{stage_update, IfMissing, LedgerStore, RecordUpdate};
use crate::error::{Result, WatchError};
use crate::model::{normalize_ticker, FundRecord};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct LedgerDocument {
    version: u32,
    funds: Vec<FundRecord>,
}

pub struct JsonFileLedger {
    path: PathBuf,
    funds: RwLock<BTreeMap<String, FundRecord>>,
}

impl JsonFileLedger {
    /// Open the ledger at `path`, starting empty when the file is missing
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let funds = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let document: LedgerDocument = serde_json::from_slice(&bytes)?;
                if document.version != FORMAT_VERSION {
                    return Err(WatchError::Storage(format!(
                        "unsupported ledger version {} in {}",
                        document.version,
                        path.display()
                    )));
                }
                document
                    .funds
                    .into_iter()
                    .map(|r| (normalize_ticker(&r.ticker), r))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Loaded {} funds from {}", funds.len(), path.display());

        Ok(Self {
            path,
            funds: RwLock::new(funds),
        })
    }

    async fn persist(&self, funds: &BTreeMap<String, FundRecord>) -> Result<()> {
        let document = LedgerDocument {
            version: FORMAT_VERSION,
            funds: funds.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            tokio::fs::remove_file(&tmp).await.ok();
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for JsonFileLedger {
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

        let previous = funds.insert(record.ticker.clone(), record.clone());
        if let Err(e) = self.persist(&funds).await {
            // Roll back so memory never runs ahead of the file
            match previous {
                Some(old) => funds.insert(record.ticker.clone(), old),
                None => funds.remove(&record.ticker),
            };
            return Err(WatchError::Storage(format!(
                "writing {}: {}",
                self.path.display(),
                e
            )));
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("ledger.json");

        let ledger = JsonFileLedger::open(&path).await.unwrap();
        assert!(ledger.list().await.unwrap().is_empty());

        ledger
            .modify("mxrf11", IfMissing::Create, &mut |r| {
                r.quantity = 100;
                r.average_cost = dec!(9.74);
                r.kind = "Paper".into();
                Ok(())
            })
            .await
            .unwrap();
        drop(ledger);

        let reopened = JsonFileLedger::open(&path).await.unwrap();
        let record = reopened.get("MXRF11").await.unwrap().unwrap();
        assert_eq!(record.quantity, 100);
        assert_eq!(record.average_cost, dec!(9.74));
        assert_eq!(record.kind, "Paper");
    }

    #[tokio::test]
    async fn test_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"{"version": 99, "funds": []}"#).unwrap();

        let result = JsonFileLedger::open(&path).await;
        assert!(matches!(result, Err(WatchError::Storage(_))));
    }

    #[tokio::test]
    async fn test_write_failure_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("ledger.json");
        std::fs::create_dir(&path).unwrap();

        let ledger = JsonFileLedger {
            path: path.clone(),
            funds: RwLock::new(BTreeMap::new()),
        };

        let result = ledger
            .modify("KNHY11", IfMissing::Create, &mut |r| {
                r.quantity = 1;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(WatchError::Storage(_))));
        assert!(ledger.get("KNHY11").await.unwrap().is_none());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
