//! Notification sinks
//!
//! Where alerts and reports are delivered. The bot binary provides the
//! Telegram implementation; this module has the ones that need no network.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WatchError};

/// Destination chat identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification sink trait
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a Markdown-formatted message to a chat
    async fn send(&self, destination: ChatId, message: &str) -> Result<()>;
}

/// Writes messages to the log instead of a chat
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, destination: ChatId, message: &str) -> Result<()> {
        tracing::info!("[chat {}] {}", destination, message);
        Ok(())
    }
}

/// Keeps every message in memory (for tests and the local web console)
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<(ChatId, String)>>,
    fail_next: AtomicBool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `send` fail once
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, destination: ChatId, message: &str) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(WatchError::Notification("simulated delivery failure".into()));
        }
        self.sent
            .lock()
            .map_err(|_| WatchError::Notification("message log poisoned".into()))?
            .push((destination, message.to_string()));
        Ok(())
    }
}
