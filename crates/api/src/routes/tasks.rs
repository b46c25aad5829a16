//! Handlers for the `/tasks` resource.
//!
//! The ingress writes `PENDING` rows and reads task state. It never
//! transitions tasks; the dispatcher and engines own every later state
//! change.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use taskbench_core::error::CoreError;
use taskbench_core::types::TaskId;
use taskbench_db::models::{NewTask, TaskListQuery};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Default page size for `GET /tasks/`.
const DEFAULT_LIST_LIMIT: i64 = 100;
/// Hard cap on page size.
const MAX_LIST_LIMIT: i64 = 500;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /tasks/
///
/// Create a new task. Returns 201 with the created row; the task starts
/// in `PENDING` status and will be picked up by the dispatcher.
async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<NewTask>,
) -> AppResult<impl IntoResponse> {
    if input.complexity < 1 {
        return Err(AppError::Core(CoreError::Validation(
            "complexity must be at least 1".into(),
        )));
    }

    let task = state.store.insert(input).await?;

    tracing::info!(
        task_id = %task.id,
        task_type = %task.task_type,
        complexity = task.complexity,
        "Task created",
    );

    Ok((StatusCode::CREATED, Json(task)))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /tasks/
///
/// List tasks, newest first. Supports `skip` and `limit` query
/// parameters; `limit` defaults to 100 and is capped at 500.
async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListQuery>,
) -> AppResult<impl IntoResponse> {
    let skip = params.skip.unwrap_or(0).max(0);
    // An explicit limit=0 is honored with an empty page.
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .min(MAX_LIST_LIMIT)
        .max(0);

    let tasks = state.store.list(skip, limit).await?;
    Ok(Json(tasks))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /tasks/{id}
///
/// Get a single task by id. Returns 404 when no such task exists.
async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
) -> AppResult<impl IntoResponse> {
    let task = state
        .store
        .get(task_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Task",
            id: task_id.to_string(),
        }))?;

    Ok(Json(task))
}

/// Mount task routes. The collection answers with and without the
/// trailing slash.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task).get(list_tasks))
        .route("/tasks/", post(create_task).get(list_tasks))
        .route("/tasks/{id}", get(get_task))
}
