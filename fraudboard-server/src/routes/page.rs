//! GET / - the dashboard page

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use fraudboard_core::summary::TransactionFilter;

use super::FilterParams;
use crate::render::{self, PageInput};
use crate::state::AppState;

/// Always 200: retrieval failures render as warnings inside the page.
async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Html<String> {
    let dashboard = state.dashboard();
    let (daily, transactions, merchants) = tokio::join!(
        dashboard.daily_stats(),
        dashboard.recent_transactions(),
        dashboard.merchant_stats(),
    );

    for err in [daily.as_ref().err(), transactions.as_ref().err(), merchants.as_ref().err()]
        .into_iter()
        .flatten()
    {
        tracing::warn!(kind = ?err.kind(), "Dashboard section unavailable: {}", err);
    }

    Html(render::page(&PageInput {
        source: dashboard.source_name().to_string(),
        filter: TransactionFilter::from(params),
        daily,
        transactions,
        merchants,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}
