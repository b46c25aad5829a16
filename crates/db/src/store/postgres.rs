//! PostgreSQL task store.
//!
//! Each trait method is a single SQL statement (or a statement with a
//! locking subquery), so atomicity comes from the database. Batch
//! transitions use `FOR UPDATE SKIP LOCKED` in the selecting subquery
//! to prevent double-dispatch if a second instance is ever pointed at
//! the same table.

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use taskbench_core::types::{TaskId, Timestamp};

use crate::models::{NewTask, Task, TaskOutcome, TaskStatus, TaskType};
use crate::DbPool;

use super::{StoreError, TaskStore};

/// Column list for `tasks` queries.
const COLUMNS: &str = "\
    id, task_type, status, complexity, \
    expected_duration_sec, payload_size_kb, \
    created_at, dispatched_at, started_at, finished_at, \
    error_message";

/// Raw row shape; `task_type` and `status` are TEXT in the table and
/// parsed into their enums on the way out.
#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    task_type: String,
    status: String,
    complexity: i32,
    expected_duration_sec: Option<i32>,
    payload_size_kb: Option<i32>,
    created_at: Timestamp,
    dispatched_at: Option<Timestamp>,
    started_at: Option<Timestamp>,
    finished_at: Option<Timestamp>,
    error_message: Option<String>,
}

impl TaskRow {
    fn into_task(self) -> Result<Task, StoreError> {
        let task_type: TaskType = self
            .task_type
            .parse()
            .map_err(|e: String| StoreError::Database(sqlx::Error::Decode(e.into())))?;
        let status: TaskStatus = self
            .status
            .parse()
            .map_err(|e: String| StoreError::Database(sqlx::Error::Decode(e.into())))?;
        Ok(Task {
            id: self.id,
            task_type,
            status,
            complexity: self.complexity,
            expected_duration_sec: self.expected_duration_sec,
            payload_size_kb: self.payload_size_kb,
            created_at: self.created_at,
            dispatched_at: self.dispatched_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            error_message: self.error_message,
        })
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>, StoreError> {
    rows.into_iter().map(TaskRow::into_task).collect()
}

/// PostgreSQL `TaskStore` implementation over a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert(&self, new: NewTask) -> Result<Task, StoreError> {
        let query = format!(
            "INSERT INTO tasks \
                 (id, task_type, status, complexity, expected_duration_sec, payload_size_kb, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&query)
            .bind(Uuid::new_v4())
            .bind(new.task_type.as_str())
            .bind(TaskStatus::Pending.as_str())
            .bind(new.complexity)
            .bind(new.expected_duration_sec)
            .bind(new.payload_size_kb)
            .bind(chrono::Utc::now())
            .fetch_one(&self.pool)
            .await?;
        row.into_task()
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TaskRow::into_task).transpose()
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Task>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks \
             ORDER BY created_at DESC \
             LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, TaskRow>(&query)
            .bind(limit.max(0))
            .bind(skip.max(0))
            .fetch_all(&self.pool)
            .await?;
        into_tasks(rows)
    }

    async fn dispatch_batch(&self, limit: i64, now: Timestamp) -> Result<Vec<Task>, StoreError> {
        let query = format!(
            "UPDATE tasks \
             SET status = $1, dispatched_at = $2 \
             WHERE id IN ( \
                 SELECT id FROM tasks \
                 WHERE status = $3 \
                 ORDER BY created_at ASC \
                 LIMIT $4 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let rows = sqlx::query_as::<_, TaskRow>(&query)
            .bind(TaskStatus::Dispatched.as_str())
            .bind(now)
            .bind(TaskStatus::Pending.as_str())
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;
        into_tasks(rows)
    }

    async fn claim_batch(
        &self,
        task_type: TaskType,
        limit: i64,
        now: Timestamp,
    ) -> Result<Vec<Task>, StoreError> {
        let query = format!(
            "UPDATE tasks \
             SET status = $1, started_at = $2 \
             WHERE id IN ( \
                 SELECT id FROM tasks \
                 WHERE status = $3 AND task_type = $4 \
                 ORDER BY created_at ASC \
                 LIMIT $5 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let rows = sqlx::query_as::<_, TaskRow>(&query)
            .bind(TaskStatus::Running.as_str())
            .bind(now)
            .bind(TaskStatus::Dispatched.as_str())
            .bind(task_type.as_str())
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;
        into_tasks(rows)
    }

    async fn finalize(&self, outcome: &TaskOutcome) -> Result<bool, StoreError> {
        let status = if outcome.success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        let result = sqlx::query(
            "UPDATE tasks \
             SET status = $2, finished_at = $3, error_message = $4 \
             WHERE id = $1",
        )
        .bind(outcome.task_id)
        .bind(status.as_str())
        .bind(outcome.finished_at)
        .bind(outcome.error.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn snapshot(&self) -> Result<Vec<Task>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM tasks ORDER BY created_at ASC");
        let rows = sqlx::query_as::<_, TaskRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        into_tasks(rows)
    }

    async fn truncate(&self) -> Result<(), StoreError> {
        sqlx::query("TRUNCATE TABLE tasks").execute(&self.pool).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
