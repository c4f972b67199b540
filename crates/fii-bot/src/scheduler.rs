//! Watch Scheduler
//!
//! Runs the single watch loop shared by every chat that sent `/start`,
//! plus the optional daily closing report.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use fii_watch::{
    ChatId, LedgerStore, Notifier, Portfolio, PriceWatcher, QuoteSource, TrackedTargets, WatchConfig,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Timing for the watch loop
#[derive(Clone, Debug)]
pub struct Schedule {
    /// Time between ticks
    pub interval: Duration,

    /// Delay before the first tick
    pub first_delay: Duration,
}

/// One price watcher for the tracked set, fanned out to every watched
/// chat. Ticks run one after another inside a single task.
pub struct WatchScheduler {
    watcher: Arc<PriceWatcher>,
    targets: Arc<TrackedTargets>,
    schedule: Schedule,
    chats: Arc<Mutex<BTreeSet<ChatId>>>,
    job: Mutex<Option<JoinHandle<()>>>,
}

impl WatchScheduler {
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        ledger: Arc<dyn LedgerStore>,
        notifier: Arc<dyn Notifier>,
        targets: Arc<TrackedTargets>,
        watch: WatchConfig,
        schedule: Schedule,
    ) -> Self {
        Self {
            watcher: Arc::new(PriceWatcher::new(quotes, ledger, notifier, watch)),
            targets,
            schedule,
            chats: Arc::new(Mutex::new(BTreeSet::new())),
            job: Mutex::new(None),
        }
    }

    pub fn targets(&self) -> &TrackedTargets {
        &self.targets
    }

    /// Add a chat to the watch. The loop starts with the first chat; a chat
    /// that is already watched keeps its alert history.
    ///
    /// Returns `true` when the chat was already being watched.
    pub async fn start(&self, chat: ChatId) -> bool {
        let already_watched = !self.chats.lock().await.insert(chat);

        let mut job = self.job.lock().await;
        if job.is_none() {
            *job = Some(self.spawn_loop());
        }

        tracing::info!(
            "👀 Watching {} funds for chat {} every {:?}{}",
            self.targets.len(),
            chat,
            self.schedule.interval,
            if already_watched { " (already watched)" } else { "" }
        );
        already_watched
    }

    fn spawn_loop(&self) -> JoinHandle<()> {
        let watcher = self.watcher.clone();
        let targets = self.targets.clone();
        let chats = self.chats.clone();
        let Schedule { interval, first_delay } = self.schedule.clone();

        tokio::spawn(async move {
            let mut timer = tokio::time::interval_at(Instant::now() + first_delay, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;
                let destinations: Vec<ChatId> = chats.lock().await.iter().copied().collect();
                let report = watcher.run_tick(&targets, &destinations).await;
                tracing::debug!(
                    "Tick for {} chats: {} alerts, {} skipped",
                    destinations.len(),
                    report.alerts(),
                    report.skipped()
                );
            }
        })
    }

    /// Chats with a running watch
    pub async fn chats(&self) -> Vec<ChatId> {
        self.chats.lock().await.iter().copied().collect()
    }

    pub async fn stop_all(&self) {
        if let Some(handle) = self.job.lock().await.take() {
            handle.abort();
        }
        let mut chats = self.chats.lock().await;
        tracing::debug!("Stopped watch for {} chats", chats.len());
        chats.clear();
    }
}

/// Time left until the next `at` (UTC). Exactly `at` counts as a full day
/// away, so a report that just ran is not sent twice.
pub fn until_next(now: DateTime<Utc>, at: NaiveTime) -> Duration {
    let today = now.date_naive().and_time(at).and_utc();
    let next = if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or_default()
}

/// Send the closing report to every watched chat once a day.
/// Nothing is sent while the portfolio is empty.
pub fn spawn_daily_report(
    scheduler: Arc<WatchScheduler>,
    portfolio: Arc<Portfolio>,
    notifier: Arc<dyn Notifier>,
    at: NaiveTime,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(until_next(Utc::now(), at)).await;

            let report = match portfolio.summary().await {
                Ok(summary) => summary.daily_report(Utc::now().date_naive()),
                Err(e) => {
                    tracing::warn!("Closing report skipped: {}", e);
                    continue;
                }
            };
            let Some(report) = report else {
                tracing::debug!("Closing report skipped: portfolio is empty");
                continue;
            };

            for chat in scheduler.chats().await {
                if let Err(e) = notifier.send(chat, &report).await {
                    tracing::warn!("Closing report to chat {} failed: {}", chat, e);
                }
            }
        }
    })
}
