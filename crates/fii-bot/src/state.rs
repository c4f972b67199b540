//! Application State

use std::sync::Arc;

use fii_watch::Portfolio;

use crate::commands::CommandDispatcher;
use crate::scheduler::WatchScheduler;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Ledger bookkeeping and summaries
    pub portfolio: Arc<Portfolio>,

    /// Same command handling the chat gets
    pub dispatcher: Arc<CommandDispatcher>,

    /// The shared watch loop, its chats and the tracked targets
    pub scheduler: Arc<WatchScheduler>,

    /// Whether alerts go to Telegram or only to the log
    pub telegram_enabled: bool,
}
