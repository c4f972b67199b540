//! HTTP Handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    Json,
};
use fii_watch::{ChatId, FundRecord, PortfolioSummary, WatchError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::commands::CONSOLE_CHAT;
use crate::page;
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub telegram_configured: bool,
    pub watched_chats: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// A ledger record with its derived metrics
#[derive(Debug, Serialize)]
pub struct FundView {
    #[serde(flatten)]
    pub record: FundRecord,
    pub invested: Decimal,
    pub market_value: Decimal,
    pub profit: Decimal,
    pub profit_percent: Decimal,
    pub monthly_income: Decimal,
    pub dividend_yield: Decimal,
    pub distance_to_target: Decimal,
    pub price_to_book: Decimal,
    pub magic_number: u64,
    pub magic_progress: Decimal,
}

impl From<FundRecord> for FundView {
    fn from(record: FundRecord) -> Self {
        Self {
            invested: record.invested(),
            market_value: record.market_value(),
            profit: record.profit(),
            profit_percent: record.profit_percent(),
            monthly_income: record.monthly_income(),
            dividend_yield: record.dividend_yield(),
            distance_to_target: record.distance_to_target(),
            price_to_book: record.price_to_book(),
            magic_number: record.magic_number(),
            magic_progress: record.magic_progress(),
            record,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub text: String,
    #[serde(default)]
    pub chat_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub reply: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn ledger_error(e: &WatchError) -> ApiError {
    tracing::error!("Ledger read failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
            code: "LEDGER_ERROR".into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        telegram_configured: state.telegram_enabled,
        watched_chats: state.scheduler.chats().await.len(),
    })
}

/// Every ledger record, ordered by ticker
pub async fn list_funds(State(state): State<AppState>) -> Result<Json<Vec<FundView>>, ApiError> {
    let records = state.portfolio.records().await.map_err(|e| ledger_error(&e))?;
    Ok(Json(records.into_iter().map(FundView::from).collect()))
}

/// Portfolio totals over held funds
pub async fn portfolio_summary(
    State(state): State<AppState>,
) -> Result<Json<PortfolioSummary>, ApiError> {
    state.portfolio.summary().await.map(Json).map_err(|e| ledger_error(&e))
}

/// Run a chat command from the web console. Without a `chat_id` the
/// command runs as the console chat.
pub async fn run_command(
    State(state): State<AppState>,
    Json(payload): Json<CommandRequest>,
) -> Json<CommandResponse> {
    let chat = payload.chat_id.map_or(CONSOLE_CHAT, ChatId);
    let reply = state.dispatcher.dispatch(chat, &payload.text).await;
    Json(CommandResponse { reply })
}

/// Summary page
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let records = state.portfolio.records().await.map_err(|e| ledger_error(&e))?;
    let summary = PortfolioSummary::from_records(&records);
    Ok(Html(page::render(&records, &summary, state.scheduler.targets())))
}
