//! fii-bot
//!
//! Telegram bot and summary web page for the FII price watcher.
//!
//! Watches target prices for every chat that sent `/start`, answers
//! portfolio commands and serves a read-only HTML summary plus a small
//! JSON API.

mod commands;
mod config;
mod handlers;
mod page;
mod scheduler;
mod state;
mod telegram;

use std::sync::Arc;

use axum::{routing::{get, post}, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fii_watch::{JsonFileLedger, LedgerStore, LogNotifier, Notifier, Portfolio, QuoteSource, YahooQuoteSource};

use crate::commands::CommandDispatcher;
use crate::config::AppConfig;
use crate::handlers::{health_check, index, list_funds, portfolio_summary, run_command};
use crate::scheduler::{spawn_daily_report, Schedule, WatchScheduler};
use crate::state::AppState;
use crate::telegram::{run_polling, TelegramClient};

fn build_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & page
        .route("/", get(index))
        .route("/health", get(health_check))

        // Ledger API
        .route("/api/funds", get(list_funds))
        .route("/api/summary", get(portfolio_summary))
        .route("/api/command", post(run_command))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Market data
    let quotes: Arc<dyn QuoteSource> = Arc::new(YahooQuoteSource::new(config.yahoo.clone())?);
    tracing::info!("✓ Quotes from {}", quotes.name());

    // Ledger
    let ledger: Arc<dyn LedgerStore> = Arc::new(JsonFileLedger::open(config.ledger_path.clone()).await?);
    tracing::info!(
        "✓ Ledger at {} ({} funds)",
        config.ledger_path.display(),
        ledger.list().await?.len()
    );

    // Notifications
    let bot = match &config.telegram {
        Some(telegram) => Some(Arc::new(TelegramClient::new(telegram)?)),
        None => {
            tracing::warn!("⚠ Telegram not configured - alerts go to the log only");
            tracing::warn!("  Set TELEGRAM_BOT_TOKEN in .env");
            None
        }
    };
    let notifier: Arc<dyn Notifier> = match &bot {
        Some(client) => client.clone(),
        None => Arc::new(LogNotifier),
    };

    let portfolio = Arc::new(Portfolio::new(ledger.clone()));
    let scheduler = Arc::new(WatchScheduler::new(
        quotes.clone(),
        ledger,
        notifier.clone(),
        Arc::new(config.targets.clone()),
        config.watch.clone(),
        Schedule {
            interval: config.watch_interval,
            first_delay: config.first_tick_delay,
        },
    ));
    let dispatcher = Arc::new(CommandDispatcher::new(
        portfolio.clone(),
        quotes,
        scheduler.clone(),
        config.watch.quote_timeout,
    ));

    tracing::info!("Tracking {} funds:", config.targets.len());
    for (ticker, target) in config.targets.iter() {
        tracing::info!("  • {} (target R$ {})", ticker, target);
    }

    if let Some(chat) = config.auto_start_chat {
        scheduler.start(chat).await;
    }

    if let Some(at) = config.daily_report_at {
        spawn_daily_report(scheduler.clone(), portfolio.clone(), notifier, at);
        tracing::info!("✓ Closing report daily at {} UTC", at.format("%H:%M"));
    }

    if let Some(client) = bot.clone() {
        tokio::spawn(run_polling(client, dispatcher.clone()));
    }

    // Build application state
    let state = AppState {
        portfolio,
        dispatcher,
        scheduler: scheduler.clone(),
        telegram_enabled: bot.is_some(),
    };
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 fii-bot running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /             - Summary page");
    tracing::info!("  GET  /health       - Health check");
    tracing::info!("  GET  /api/funds    - Ledger records");
    tracing::info!("  GET  /api/summary  - Portfolio totals");
    tracing::info!("  POST /api/command  - Run a chat command");
    tracing::info!("");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop_all().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use fii_watch::{MemoryLedger, MemoryNotifier, MockQuoteSource, TrackedTargets, WatchConfig};
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    fn app() -> Router {
        let quotes: Arc<dyn QuoteSource> = Arc::new(MockQuoteSource::new().with_price("HGLG11", dec!(150.00)));
        let ledger: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let scheduler = Arc::new(WatchScheduler::new(
            quotes.clone(),
            ledger.clone(),
            Arc::new(MemoryNotifier::new()),
            Arc::new(TrackedTargets::new().with("HGLG11", dec!(157.30))),
            WatchConfig::default(),
            Schedule {
                interval: Duration::from_secs(300),
                first_delay: Duration::from_secs(10),
            },
        ));
        let portfolio = Arc::new(Portfolio::new(ledger));
        let dispatcher = Arc::new(CommandDispatcher::new(
            portfolio.clone(),
            quotes,
            scheduler.clone(),
            Duration::from_secs(1),
        ));

        build_router(AppState {
            portfolio,
            dispatcher,
            scheduler,
            telegram_enabled: false,
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn command(text: &str) -> Request<Body> {
        Request::post("/api/command")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "text": text }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["telegram_configured"], false);
        assert_eq!(json["watched_chats"], 0);
    }

    #[tokio::test]
    async fn test_command_then_funds() {
        let app = app();

        let response = app.clone().oneshot(command("/buy hglg11 2 155 Brick")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["reply"].as_str().unwrap().contains("HGLG11"));

        let response = app
            .clone()
            .oneshot(Request::get("/api/funds").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json[0]["ticker"], "HGLG11");
        assert_eq!(json[0]["quantity"], 2);

        let response = app
            .oneshot(Request::get("/api/summary").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["holdings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_console_start_needs_chat_id() {
        let app = app();

        let response = app.clone().oneshot(command("/start")).await.unwrap();
        let json = body_json(response).await;
        assert!(json["reply"].as_str().unwrap().contains("chat_id"));

        let request = Request::post("/api/command")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "text": "/start", "chat_id": 1234 }).to_string()))
            .unwrap();
        let json = body_json(app.clone().oneshot(request).await.unwrap()).await;
        assert!(json["reply"].as_str().unwrap().contains("Watch armed"));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["watched_chats"], 1);
    }

    #[tokio::test]
    async fn test_index_page() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Portfolio is empty"));
        assert!(html.contains("HGLG11"));
    }
}
