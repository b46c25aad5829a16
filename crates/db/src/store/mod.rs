//! The `TaskStore` contract and its implementations.
//!
//! The store is the only shared mutable resource in the pipeline. Every
//! trait method is a single atomic unit against the backing store: batch
//! transitions are all-or-nothing, finalization commits one row at a
//! time. The claim protocol built on top of these methods is only safe
//! with one active dispatcher and one active engine per workload class.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use taskbench_core::types::{TaskId, Timestamp};

use crate::models::{NewTask, Task, TaskOutcome, TaskType};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors surfaced by a task store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing database failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Narrow contract over the durable task table.
///
/// Implementations must apply each method atomically; callers never see
/// a partially applied batch. Reads used for transitions and the
/// subsequent writes happen inside the same unit, so a racing second
/// reader cannot select rows that are about to be flipped.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task in `PENDING` state. Returns the created row.
    async fn insert(&self, new: NewTask) -> Result<Task, StoreError>;

    /// Fetch a task by id.
    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// List tasks ordered by `created_at` descending, with pagination.
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Task>, StoreError>;

    /// Atomically transition up to `limit` of the oldest `PENDING` tasks
    /// to `DISPATCHED`, stamping `dispatched_at = now`. FIFO by
    /// `created_at`. Returns the transitioned rows; empty when there is
    /// no pending work.
    async fn dispatch_batch(&self, limit: i64, now: Timestamp) -> Result<Vec<Task>, StoreError>;

    /// Atomically transition up to `limit` of the oldest `DISPATCHED`
    /// tasks of `task_type` to `RUNNING`, stamping `started_at = now`.
    /// Once this commits the rows belong to the calling engine.
    async fn claim_batch(
        &self,
        task_type: TaskType,
        limit: i64,
        now: Timestamp,
    ) -> Result<Vec<Task>, StoreError>;

    /// Apply one workload outcome: set `finished_at` and move the row to
    /// `COMPLETED` (error cleared) or `FAILED` (error recorded). Returns
    /// `false` when the row no longer exists, in which case the caller
    /// skips it silently.
    async fn finalize(&self, outcome: &TaskOutcome) -> Result<bool, StoreError>;

    /// Full scan of all task rows, for the stats aggregator.
    async fn snapshot(&self) -> Result<Vec<Task>, StoreError>;

    /// Destructive full-table reset (admin escape hatch).
    async fn truncate(&self) -> Result<(), StoreError>;

    /// Cheap reachability probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
