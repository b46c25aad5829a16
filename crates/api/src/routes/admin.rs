//! Destructive admin endpoints, disabled unless explicitly enabled.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use taskbench_core::error::CoreError;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /admin/truncate
///
/// Delete every task row. Gated behind the `ENABLE_DB_ADMIN`
/// configuration flag; returns 403 when the flag is off, regardless of
/// the table's contents.
async fn truncate_tasks(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    if !state.config.enable_db_admin {
        return Err(AppError::Core(CoreError::Forbidden(
            "Database admin endpoints are disabled".into(),
        )));
    }

    state.store.truncate().await?;
    tracing::warn!("Task table truncated via admin endpoint");

    Ok(Json(json!({ "ok": true })))
}

/// Mount admin routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin/truncate", post(truncate_tasks))
}
