//! Error Types for the FII watcher

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WatchError>;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Price unavailable for {0}")]
    PriceUnavailable(String),

    #[error("Quote source error: {0}")]
    QuoteSource(String),

    #[error("Fund not found: {0}")]
    FundNotFound(String),

    #[error("Insufficient holdings of {ticker}: requested {requested}, held {held}")]
    InsufficientHoldings {
        ticker: String,
        requested: u64,
        held: u64,
    },

    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount {
        field: &'static str,
        value: Decimal,
    },

    /// Malformed command arguments; carries the usage line to show
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Ledger storage error: {0}")]
    Storage(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WatchError {
    /// Transient failures that a later tick may not hit again
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PriceUnavailable(_)
                | Self::QuoteSource(_)
                | Self::Network(_)
                | Self::Notification(_)
                | Self::Io(_)
        )
    }

    /// Message shown to the chat user at the command boundary
    pub fn user_message(&self) -> String {
        match self {
            Self::PriceUnavailable(ticker) => {
                format!("❌ No price found for *{ticker}*. Check the ticker.")
            }
            Self::FundNotFound(ticker) => format!("❌ {ticker} not found."),
            Self::InsufficientHoldings { held, .. } => {
                format!("❌ You only hold {held} shares.")
            }
            Self::InvalidAmount { field, .. } => format!("⚠️ Invalid {field}."),
            Self::Usage(usage) => format!("⚠️ Use: {usage}"),
            Self::UnknownCommand(name) => {
                format!("🤷 Unknown command /{name}. Try /help.")
            }
            _ => "💥 Something went wrong accessing the ledger.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = WatchError::InsufficientHoldings {
            ticker: "MXRF11".into(),
            requested: 20,
            held: 5,
        };
        assert_eq!(err.user_message(), "❌ You only hold 5 shares.");
        assert!(!err.is_retryable());

        let err = WatchError::Storage("disk full".into());
        assert!(err.user_message().contains("Something went wrong"));
        assert!(!err.user_message().contains("disk full"));
    }

    #[test]
    fn test_retryable() {
        assert!(WatchError::PriceUnavailable("HGLG11".into()).is_retryable());
        assert!(!WatchError::Usage("/sell TICKER QTY").is_retryable());
    }
}
