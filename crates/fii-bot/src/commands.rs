//! Command Dispatcher
//!
//! Runs a parsed chat command and renders the reply text. Every failure
//! ends up as a user-facing message; nothing here returns an error to the
//! transport.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fii_watch::command::HELP_TEXT;
use fii_watch::quote::lookup_with_timeout;
use fii_watch::report::{money, percent};
use fii_watch::{ChatId, Command, Portfolio, QuoteSource, Result, WatchError};

use crate::scheduler::WatchScheduler;

const EMPTY_PORTFOLIO: &str = "📭 Portfolio is empty.";

/// Chat id for commands sent from the web console without a `chat_id`.
/// It can run every command except `/start`, since nothing can deliver
/// alerts to it.
pub const CONSOLE_CHAT: ChatId = ChatId(0);

pub struct CommandDispatcher {
    portfolio: Arc<Portfolio>,
    quotes: Arc<dyn QuoteSource>,
    scheduler: Arc<WatchScheduler>,
    quote_timeout: Duration,
}

impl CommandDispatcher {
    pub fn new(
        portfolio: Arc<Portfolio>,
        quotes: Arc<dyn QuoteSource>,
        scheduler: Arc<WatchScheduler>,
        quote_timeout: Duration,
    ) -> Self {
        Self {
            portfolio,
            quotes,
            scheduler,
            quote_timeout,
        }
    }

    /// Reply for one chat message
    pub async fn dispatch(&self, chat: ChatId, text: &str) -> String {
        let result = match Command::parse(text) {
            Ok(command) => self.execute(chat, command).await,
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            match &e {
                WatchError::Storage(_) | WatchError::Io(_) | WatchError::Serialization(_) => {
                    tracing::error!("Command '{}' from chat {} failed: {}", text, chat, e);
                }
                _ => tracing::debug!("Command '{}' from chat {} rejected: {}", text, chat, e),
            }
            e.user_message()
        })
    }

    async fn execute(&self, chat: ChatId, command: Command) -> Result<String> {
        match command {
            Command::Start if chat == CONSOLE_CHAT => {
                Err(WatchError::Usage("/start with the chat_id that should receive alerts"))
            }
            Command::Start => {
                self.scheduler.start(chat).await;
                Ok(format!(
                    "🚀 *Watch armed!*\nTracking {} funds. I'll message you when one hits its target.",
                    self.scheduler.targets().len()
                ))
            }
            Command::Help => Ok(HELP_TEXT.to_string()),
            Command::Buy {
                ticker,
                quantity,
                price,
                kind,
            } => {
                let record = self
                    .portfolio
                    .record_buy(&ticker, quantity, price, kind.as_deref())
                    .await?;
                Ok(format!(
                    "✅ *{}* ({}) updated: {} shares, average R$ {}",
                    record.ticker,
                    record.kind,
                    record.quantity,
                    money(record.average_cost)
                ))
            }
            Command::Sell { ticker, quantity } => {
                let record = self.portfolio.record_sell(&ticker, quantity).await?;
                Ok(format!(
                    "✅ Sold! *{}* now has {} shares.",
                    record.ticker, record.quantity
                ))
            }
            Command::Dividend { ticker, amount } => {
                let record = self.portfolio.record_dividend(&ticker, amount).await?;
                Ok(format!(
                    "✅ *{}* dividend set to R$ {} (yield {}% a month)",
                    record.ticker,
                    money(record.last_dividend),
                    percent(record.dividend_yield(), 2)
                ))
            }
            Command::BookValue { ticker, amount } => {
                let record = self.portfolio.record_book_value(&ticker, amount).await?;
                Ok(format!(
                    "✅ *{}* book value set to R$ {} (P/VP {})",
                    record.ticker,
                    money(record.book_value),
                    percent(record.price_to_book(), 2)
                ))
            }
            Command::Status => {
                let summary = self.portfolio.summary().await?;
                Ok(summary
                    .status_message()
                    .unwrap_or_else(|| EMPTY_PORTFOLIO.to_string()))
            }
            Command::DailyReport => {
                let summary = self.portfolio.summary().await?;
                Ok(summary
                    .daily_report(Utc::now().date_naive())
                    .unwrap_or_else(|| EMPTY_PORTFOLIO.to_string()))
            }
            Command::Quote { ticker } => {
                let price = lookup_with_timeout(self.quotes.as_ref(), &ticker, self.quote_timeout)
                    .await
                    .map_err(|e| {
                        tracing::debug!("Quote for {} failed: {}", ticker, e);
                        WatchError::PriceUnavailable(ticker.clone())
                    })?;
                let mut reply = format!("🏢 *{}*\n💰 Current price: R$ {}", ticker, money(price));
                if let Some(target) = self.scheduler.targets().get(&ticker) {
                    reply.push_str(&format!("\n🎯 Target: R$ {}", money(target)));
                    if price <= target {
                        reply.push_str("\n✅ At or below target");
                    }
                }
                Ok(reply)
            }
        }
    }
}
