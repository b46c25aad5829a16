//! Handler for `/stats/summary`.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use taskbench_pipeline::StatsAggregator;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /stats/summary
///
/// Aggregate statistics over the whole task table, computed fresh on
/// every request. Averages over empty sets are `null`, never `0`.
async fn stats_summary(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let aggregator = StatsAggregator::new(Arc::clone(&state.store));
    let summary = aggregator.summarize().await?;
    Ok(Json(summary))
}

/// Mount stats routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/stats/summary", get(stats_summary))
}
