//! JSON endpoints over the cached query layer
//!
//! - GET /api/transactions - recent transactions, filtered
//! - GET /api/daily-stats - last seven days
//! - GET /api/merchants - riskiest merchants
//! - GET /api/summary - headline metrics, alert and chart series
//! - POST /api/refresh - drop cached results

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use fraudboard_core::summary::{Summary, TransactionFilter};
use fraudboard_core::{DailyStat, MerchantStat, Transaction};
use serde::Serialize;

use super::FilterParams;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct TransactionsResponse {
    /// Rows in the 24h window before filtering
    pub total: usize,
    pub filter: TransactionFilter,
    pub transactions: Vec<Transaction>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
}

/// GET /api/transactions
async fn transactions(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let filter = TransactionFilter::from(params);
    let rows = state.dashboard().recent_transactions().await?;

    Ok(Json(TransactionsResponse {
        total: rows.len(),
        filter,
        transactions: filter.apply(&rows).into_iter().cloned().collect(),
    }))
}

/// GET /api/daily-stats
async fn daily_stats(State(state): State<AppState>) -> Result<Json<Vec<DailyStat>>, ApiError> {
    let rows = state.dashboard().daily_stats().await?;
    Ok(Json(rows.to_vec()))
}

/// GET /api/merchants
async fn merchants(State(state): State<AppState>) -> Result<Json<Vec<MerchantStat>>, ApiError> {
    let rows = state.dashboard().merchant_stats().await?;
    Ok(Json(rows.to_vec()))
}

/// GET /api/summary
async fn summary(State(state): State<AppState>) -> Result<Json<Summary>, ApiError> {
    let dashboard = state.dashboard();
    let daily = dashboard.daily_stats().await?;
    let transactions = dashboard.recent_transactions().await?;
    let merchants = dashboard.merchant_stats().await?;

    Ok(Json(Summary::build(&daily, &transactions, &merchants)))
}

/// POST /api/refresh
async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    state.dashboard().invalidate_all().await;
    Json(RefreshResponse { status: "cleared" })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/transactions", get(transactions))
        .route("/api/daily-stats", get(daily_stats))
        .route("/api/merchants", get(merchants))
        .route("/api/summary", get(summary))
        .route("/api/refresh", post(refresh))
}
