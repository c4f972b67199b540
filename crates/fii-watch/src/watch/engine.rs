//! Price-watch engine
//!
//! One `run_tick` call evaluates every tracked ticker once and fans the
//! alerts out to every destination chat:
//!
//! ```text
//! lookup ──▶ ledger (price, target, change) ──▶ price <= target?
//!   │ unavailable: skip                              │ yes, per chat
//!   ▼                                                ▼
//!  next ticker                  chat debounce ──▶ notify ──▶ record
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::alert::OpportunityAlert;
use super::debounce::{AlertDebounce, DEFAULT_REALERT_DROP_PERCENT};
use super::targets::TrackedTargets;
use crate::error::{Result, WatchError};
use crate::ledger::{IfMissing, LedgerStore};
use crate::notify::{ChatId, Notifier};
use crate::quote::{lookup_with_timeout, QuoteSource};

/// Engine tuning
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Upper bound for a single price lookup
    pub quote_timeout: Duration,

    /// Further drop (percent) needed before the same ticker alerts again
    pub realert_drop_percent: Decimal,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            quote_timeout: Duration::from_secs(10),
            realert_drop_percent: DEFAULT_REALERT_DROP_PERCENT,
        }
    }
}

/// What happened to one ticker during a tick. Tickers at or below
/// target get one alert outcome per destination chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No usable price this tick
    Skipped,
    /// Ledger write failed; nothing else was attempted
    Failed(String),
    /// Price stored, no alert to consider
    Updated { price: Decimal, change_percent: Decimal },
    /// Price at or below target and an alert went out
    Alerted {
        chat: ChatId,
        price: Decimal,
        change_percent: Decimal,
    },
    /// Price at or below target but within this chat's debounce window
    Suppressed {
        chat: ChatId,
        price: Decimal,
        change_percent: Decimal,
    },
    /// Price at or below target but delivering the alert failed
    NotifyFailed {
        chat: ChatId,
        price: Decimal,
        error: String,
    },
}

#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub outcomes: Vec<(String, TickOutcome)>,
}

impl TickReport {
    /// First outcome recorded for a ticker
    pub fn outcome(&self, ticker: &str) -> Option<&TickOutcome> {
        self.outcomes.iter().find(|(t, _)| t == ticker).map(|(_, o)| o)
    }

    pub fn alerts(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, TickOutcome::Alerted { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, TickOutcome::Skipped))
            .count()
    }
}

/// Polls prices, keeps the ledger's price fields current and sends
/// deduplicated buy-opportunity alerts.
///
/// Alert history is kept per destination chat and lives as long as the
/// watcher does.
pub struct PriceWatcher {
    quotes: Arc<dyn QuoteSource>,
    ledger: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
    debounce: Mutex<HashMap<ChatId, AlertDebounce>>,
    config: WatchConfig,
}

impl PriceWatcher {
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        ledger: Arc<dyn LedgerStore>,
        notifier: Arc<dyn Notifier>,
        config: WatchConfig,
    ) -> Self {
        Self {
            quotes,
            ledger,
            notifier,
            debounce: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub const fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Last price alerted to `chat` for a ticker, if any alert went out
    pub async fn last_alert(&self, chat: ChatId, ticker: &str) -> Option<Decimal> {
        self.debounce
            .lock()
            .await
            .get(&chat)
            .and_then(|debounce| debounce.last_alert(ticker))
    }

    /// Evaluate every tracked ticker once, in configuration order, and
    /// alert each destination chat.
    ///
    /// Never fails: each ticker's problems are logged and reported in the
    /// returned `TickReport` without affecting the others.
    pub async fn run_tick(&self, tracked: &TrackedTargets, destinations: &[ChatId]) -> TickReport {
        let mut report = TickReport::default();

        for (ticker, target) in tracked.iter() {
            for outcome in self.evaluate(ticker, target, destinations).await {
                report.outcomes.push((ticker.to_string(), outcome));
            }
        }

        tracing::debug!(
            "Tick done for {} chats: {} tickers, {} alerts, {} skipped",
            destinations.len(),
            tracked.len(),
            report.alerts(),
            report.skipped()
        );
        report
    }

    async fn evaluate(&self, ticker: &str, target: Decimal, destinations: &[ChatId]) -> Vec<TickOutcome> {
        let price = match lookup_with_timeout(self.quotes.as_ref(), ticker, self.config.quote_timeout).await {
            Ok(price) => price,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", ticker, e);
                return vec![TickOutcome::Skipped];
            }
        };

        let change_percent = match self.store_price(ticker, price, target).await {
            Ok(change) => change,
            Err(e) => {
                log_failure(&e, format_args!("Ledger update for {ticker} failed"));
                return vec![TickOutcome::Failed(e.to_string())];
            }
        };

        if price > target || destinations.is_empty() {
            return vec![TickOutcome::Updated { price, change_percent }];
        }

        let alert = OpportunityAlert::new(ticker, price, target, change_percent);
        let message = alert.to_markdown(self.config.realert_drop_percent);

        let mut debounce = self.debounce.lock().await;
        let mut outcomes = Vec::with_capacity(destinations.len());

        for &chat in destinations {
            let history = debounce
                .entry(chat)
                .or_insert_with(|| AlertDebounce::new(self.config.realert_drop_percent));
            if !history.should_alert(ticker, price) {
                outcomes.push(TickOutcome::Suppressed {
                    chat,
                    price,
                    change_percent,
                });
                continue;
            }

            match self.notifier.send(chat, &message).await {
                Ok(()) => {
                    history.record(ticker, price);
                    tracing::info!(
                        "Opportunity alert for {} at R$ {} (target R$ {}) sent to {}",
                        ticker,
                        price,
                        target,
                        chat
                    );
                    outcomes.push(TickOutcome::Alerted {
                        chat,
                        price,
                        change_percent,
                    });
                }
                Err(e) => {
                    log_failure(&e, format_args!("Alert for {ticker} not delivered to {chat}"));
                    outcomes.push(TickOutcome::NotifyFailed {
                        chat,
                        price,
                        error: e.to_string(),
                    });
                }
            }
        }
        outcomes
    }

    /// Write price, target and change in one ledger transaction and
    /// return the change against the previously stored price.
    async fn store_price(&self, ticker: &str, price: Decimal, target: Decimal) -> Result<Decimal> {
        let record = self
            .ledger
            .modify(ticker, IfMissing::Create, &mut |record| {
                let previous = if record.current_price > Decimal::ZERO {
                    record.current_price
                } else {
                    price
                };
                record.change_percent = (price / previous - Decimal::ONE) * Decimal::ONE_HUNDRED;
                record.current_price = price;
                record.target_price = target;
                Ok(())
            })
            .await?;

        Ok(record.change_percent)
    }
}

/// Transient failures are retried by the next tick; anything else needs
/// someone to look at it.
fn log_failure(error: &WatchError, context: std::fmt::Arguments<'_>) {
    if error.is_retryable() {
        tracing::warn!("{}: {} (retrying next tick)", context, error);
    } else {
        tracing::error!("{}: {}", context, error);
    }
}
