//! Telegram Bot API client
//!
//! Long-polls `getUpdates` for chat commands and delivers replies and
//! alerts through `sendMessage`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fii_watch::{ChatId, Notifier, WatchError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commands::CommandDispatcher;

/// Pause after a failed poll before trying again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, TelegramError>;

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    pub token: String,

    /// API base URL
    pub api_url: String,

    /// Long-poll duration for `getUpdates`
    pub poll_timeout_secs: u64,
}

impl TelegramConfig {
    pub const DEFAULT_API_URL: &'static str = "https://api.telegram.org";
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// Chat and text of a slash command, if this update carries one
    pub fn command(&self) -> Option<(ChatId, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?.trim();
        text.starts_with('/').then_some((ChatId(message.chat.id), text))
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

#[derive(Serialize)]
struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

// ============================================================================
// Client
// ============================================================================

pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        // Must outlive the long poll
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()?;

        Ok(Self {
            http,
            base: format!("{}/bot{}", config.api_url.trim_end_matches('/'), config.token),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    async fn call<B: Serialize + Sync, T: DeserializeOwned + Send>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T> {
        // The URL carries the bot token, keep it out of error messages
        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;

        match response {
            ApiResponse { ok: true, result: Some(result), .. } => Ok(result),
            ApiResponse { description, .. } => Err(TelegramError::Api(
                description.unwrap_or_else(|| format!("{method} failed")),
            )),
        }
    }

    /// Send a Markdown message, falling back to plain text when Telegram
    /// cannot parse the markup
    pub async fn send_message(&self, chat: ChatId, text: &str) -> Result<()> {
        let markdown = SendMessage {
            chat_id: chat.0,
            text,
            parse_mode: Some("Markdown"),
        };

        match self.call::<_, serde_json::Value>("sendMessage", &markdown).await {
            Err(TelegramError::Api(description)) if description.contains("parse entities") => {
                tracing::debug!("Markdown rejected for chat {}, resending as plain text", chat);
                let plain = SendMessage {
                    chat_id: chat.0,
                    text,
                    parse_mode: None,
                };
                self.call::<_, serde_json::Value>("sendMessage", &plain).await?;
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: timeout_secs,
                allowed_updates: ["message"],
            },
        )
        .await
    }

    /// Offset just past any updates queued while the bot was down
    async fn skip_pending(&self) -> Option<i64> {
        match self.get_updates(Some(-1), 0).await {
            Ok(updates) => updates.last().map(|u| u.update_id + 1),
            Err(e) => {
                tracing::warn!("Could not drop pending updates: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, destination: ChatId, message: &str) -> fii_watch::Result<()> {
        self.send_message(destination, message)
            .await
            .map_err(|e| WatchError::Notification(e.to_string()))
    }
}

/// Receive commands forever, answering each one in its own task.
pub async fn run_polling(client: Arc<TelegramClient>, dispatcher: Arc<CommandDispatcher>) {
    let mut offset = client.skip_pending().await;
    tracing::info!("📨 Listening for Telegram commands");

    loop {
        let updates = match client.get_updates(offset, client.poll_timeout_secs).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("Telegram poll failed: {}", e);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            let Some((chat, text)) = update.command() else {
                continue;
            };

            tracing::debug!("Command from chat {}: {}", chat, text);
            let text = text.to_string();
            let client = client.clone();
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let reply = dispatcher.dispatch(chat, &text).await;
                if let Err(e) = client.send_message(chat, &reply).await {
                    tracing::warn!("Reply to chat {} failed: {}", chat, e);
                }
            });
        }
    }
}
