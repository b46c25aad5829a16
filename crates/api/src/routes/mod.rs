pub mod admin;
pub mod health;
pub mod stats;
pub mod tasks;

use axum::Router;

use crate::state::AppState;

/// Build the full route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                 service and database health
///
/// /tasks/                 create (POST), list (GET)
/// /tasks/{id}             get one
///
/// /stats/summary          aggregated pipeline statistics
///
/// /admin/truncate         destructive table reset (POST, gated)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(tasks::router())
        .merge(stats::router())
        .merge(admin::router())
}
