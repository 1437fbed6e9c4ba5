//! Liveness endpoint
//!
//! Never touches the database, so it stays green while the pool is down.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub source: String,
    pub cache_ttl_secs: u64,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let dashboard = state.dashboard();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        source: dashboard.source_name().to_string(),
        cache_ttl_secs: dashboard.ttl().as_secs(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
