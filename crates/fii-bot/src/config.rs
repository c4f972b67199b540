//! Process configuration, read once at startup from the environment
//! (after `.env` is loaded).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::NaiveTime;
use fii_watch::{ChatId, TrackedTargets, WatchConfig};
use fii_watch::quote::YahooConfig;
use fii_watch::watch::DEFAULT_REALERT_DROP_PERCENT;

use crate::telegram::TelegramConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Tickers and their target buy prices
    pub targets: TrackedTargets,

    /// Time between ticks
    pub watch_interval: Duration,

    /// Delay before the first tick after the first `/start`
    pub first_tick_delay: Duration,

    pub watch: WatchConfig,

    pub yahoo: YahooConfig,

    /// JSON ledger location
    pub ledger_path: PathBuf,

    pub bind_addr: String,

    /// Telegram bot (None = log-only notifications, no chat commands)
    pub telegram: Option<TelegramConfig>,

    /// Chat that gets a watch without sending `/start`
    pub auto_start_chat: Option<ChatId>,

    /// Time of day (UTC) for the scheduled closing report
    pub daily_report_at: Option<NaiveTime>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let secs = |key: &str, default: u64| -> anyhow::Result<u64> {
            var(key).map_or(Ok(default), |v| {
                v.parse().with_context(|| format!("{key} must be a whole number of seconds, got '{v}'"))
            })
        };

        let targets = match var("FII_TARGETS") {
            Some(list) => TrackedTargets::parse(&list).context("parsing FII_TARGETS")?,
            None => TrackedTargets::default_funds(),
        };

        let watch_interval = secs("WATCH_INTERVAL_SECS", 300)?;
        if watch_interval == 0 {
            bail!("WATCH_INTERVAL_SECS must be greater than zero");
        }

        let quote_timeout = secs("QUOTE_TIMEOUT_SECS", 10)?;
        let yahoo_defaults = YahooConfig::default();
        let yahoo = YahooConfig {
            base_url: var("YAHOO_CHART_URL").unwrap_or(yahoo_defaults.base_url),
            timeout_secs: quote_timeout,
        };

        let telegram = var("TELEGRAM_BOT_TOKEN").map(|token| TelegramConfig {
            api_url: var("TELEGRAM_API_URL").unwrap_or_else(|| TelegramConfig::DEFAULT_API_URL.into()),
            token,
            poll_timeout_secs: 30,
        });

        let auto_start_chat = var("TELEGRAM_CHAT_ID")
            .map(|v| v.parse::<i64>().map(ChatId))
            .transpose()
            .context("TELEGRAM_CHAT_ID must be a numeric chat id")?;

        let daily_report_at = var("DAILY_REPORT_AT")
            .map(|v| NaiveTime::parse_from_str(&v, "%H:%M"))
            .transpose()
            .context("DAILY_REPORT_AT must look like HH:MM")?;

        Ok(Self {
            targets,
            watch_interval: Duration::from_secs(watch_interval),
            first_tick_delay: Duration::from_secs(secs("WATCH_FIRST_DELAY_SECS", 10)?),
            watch: WatchConfig {
                quote_timeout: Duration::from_secs(quote_timeout),
                realert_drop_percent: DEFAULT_REALERT_DROP_PERCENT,
            },
            yahoo,
            ledger_path: var("LEDGER_PATH").map_or_else(|| PathBuf::from("data/ledger.json"), PathBuf::from),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            telegram,
            auto_start_chat,
            daily_report_at,
        })
    }
}
