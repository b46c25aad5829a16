//! Task entity model and DTOs for the lifecycle pipeline.

use serde::{Deserialize, Serialize};
use taskbench_core::types::{TaskId, Timestamp};

use super::status::{TaskStatus, TaskType};

/// A row from the `tasks` table.
///
/// Timestamps are set exactly once each and are non-decreasing:
/// `created_at <= dispatched_at <= started_at <= finished_at`
/// whenever the later ones are present.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub complexity: i32,
    pub expected_duration_sec: Option<i32>,
    pub payload_size_kb: Option<i32>,
    pub created_at: Timestamp,
    pub dispatched_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub error_message: Option<String>,
}

/// DTO for creating a task via `POST /tasks/`.
///
/// `expected_duration_sec` and `payload_size_kb` are client-supplied
/// hints; they are stored and echoed back but never interpreted by the
/// pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub task_type: TaskType,
    pub complexity: i32,
    pub expected_duration_sec: Option<i32>,
    pub payload_size_kb: Option<i32>,
}

/// Query parameters for `GET /tasks/`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    /// Number of results to skip. Defaults to 0.
    pub skip: Option<i64>,
    /// Maximum number of results. Defaults to 100, capped at 500.
    pub limit: Option<i64>,
}

/// Result of executing one claimed task's workload.
///
/// Produced by the execution engine's worker pool and applied to the
/// store one row at a time during finalization.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task_id: TaskId,
    pub success: bool,
    pub error: Option<String>,
    pub finished_at: Timestamp,
}

impl TaskOutcome {
    /// A successful outcome finished at `finished_at`.
    pub fn success(task_id: TaskId, finished_at: Timestamp) -> Self {
        Self {
            task_id,
            success: true,
            error: None,
            finished_at,
        }
    }

    /// A failed outcome carrying the workload's error message.
    pub fn failure(task_id: TaskId, error: impl Into<String>, finished_at: Timestamp) -> Self {
        Self {
            task_id,
            success: false,
            error: Some(error.into()),
            finished_at,
        }
    }
}
