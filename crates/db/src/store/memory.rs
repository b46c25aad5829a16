//! In-memory task store.
//!
//! Backs unit and integration tests, and single-process embedders that
//! do not need durability. A single `tokio::sync::Mutex` around the
//! table is the atomicity boundary, which satisfies the store contract
//! trivially: no reader can observe a half-applied batch.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use taskbench_core::types::{TaskId, Timestamp};

use crate::models::{NewTask, Task, TaskOutcome, TaskStatus, TaskType};

use super::{StoreError, TaskStore};

/// A stored row plus its insertion sequence number.
///
/// `created_at` alone is not a total order (two inserts can land on the
/// same tick), so FIFO selection tie-breaks on the sequence.
struct StoredTask {
    task: Task,
    seq: u64,
}

#[derive(Default)]
struct TableState {
    rows: HashMap<TaskId, StoredTask>,
    next_seq: u64,
}

impl TableState {
    /// Ids of rows matching `status` (and optionally `task_type`),
    /// oldest first, at most `limit`.
    fn select_oldest(
        &self,
        status: TaskStatus,
        task_type: Option<TaskType>,
        limit: i64,
    ) -> Vec<TaskId> {
        let mut matching: Vec<&StoredTask> = self
            .rows
            .values()
            .filter(|s| s.task.status == status)
            .filter(|s| task_type.map_or(true, |t| s.task.task_type == t))
            .collect();
        matching.sort_by_key(|s| (s.task.created_at, s.seq));
        matching
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|s| s.task.id)
            .collect()
    }
}

/// In-memory `TaskStore` implementation.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<TableState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert(&self, new: NewTask) -> Result<Task, StoreError> {
        let mut state = self.state.lock().await;
        let task = Task {
            id: Uuid::new_v4(),
            task_type: new.task_type,
            status: TaskStatus::Pending,
            complexity: new.complexity,
            expected_duration_sec: new.expected_duration_sec,
            payload_size_kb: new.payload_size_kb,
            created_at: chrono::Utc::now(),
            dispatched_at: None,
            started_at: None,
            finished_at: None,
            error_message: None,
        };
        let seq = state.next_seq;
        state.next_seq += 1;
        state.rows.insert(task.id, StoredTask {
            task: task.clone(),
            seq,
        });
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.rows.get(&id).map(|s| s.task.clone()))
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Task>, StoreError> {
        let state = self.state.lock().await;
        let mut rows: Vec<&StoredTask> = state.rows.values().collect();
        // Newest first, matching the PostgreSQL implementation.
        rows.sort_by_key(|s| std::cmp::Reverse((s.task.created_at, s.seq)));
        Ok(rows
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|s| s.task.clone())
            .collect())
    }

    async fn dispatch_batch(&self, limit: i64, now: Timestamp) -> Result<Vec<Task>, StoreError> {
        let mut state = self.state.lock().await;
        let ids = state.select_oldest(TaskStatus::Pending, None, limit);
        let mut dispatched = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(stored) = state.rows.get_mut(&id) {
                stored.task.status = TaskStatus::Dispatched;
                stored.task.dispatched_at = Some(now);
                dispatched.push(stored.task.clone());
            }
        }
        Ok(dispatched)
    }

    async fn claim_batch(
        &self,
        task_type: TaskType,
        limit: i64,
        now: Timestamp,
    ) -> Result<Vec<Task>, StoreError> {
        let mut state = self.state.lock().await;
        let ids = state.select_oldest(TaskStatus::Dispatched, Some(task_type), limit);
        let mut claimed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(stored) = state.rows.get_mut(&id) {
                stored.task.status = TaskStatus::Running;
                stored.task.started_at = Some(now);
                claimed.push(stored.task.clone());
            }
        }
        Ok(claimed)
    }

    async fn finalize(&self, outcome: &TaskOutcome) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.rows.get_mut(&outcome.task_id) else {
            return Ok(false);
        };
        stored.task.finished_at = Some(outcome.finished_at);
        if outcome.success {
            stored.task.status = TaskStatus::Completed;
            stored.task.error_message = None;
        } else {
            stored.task.status = TaskStatus::Failed;
            stored.task.error_message = outcome.error.clone();
        }
        Ok(true)
    }

    async fn snapshot(&self) -> Result<Vec<Task>, StoreError> {
        let state = self.state.lock().await;
        let mut rows: Vec<&StoredTask> = state.rows.values().collect();
        rows.sort_by_key(|s| s.seq);
        Ok(rows.into_iter().map(|s| s.task.clone()).collect())
    }

    async fn truncate(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.rows.clear();
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task(task_type: TaskType, complexity: i32) -> NewTask {
        NewTask {
            task_type,
            complexity,
            expected_duration_sec: None,
            payload_size_kb: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_pending_status() {
        let store = MemoryStore::new();
        let task = store
            .insert(new_task(TaskType::CpuIntensive, 3))
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.complexity, 3);
        assert!(task.dispatched_at.is_none());
        assert!(task.started_at.is_none());
        assert!(task.finished_at.is_none());
        assert!(task.error_message.is_none());

        let fetched = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, task.id);
    }

    #[tokio::test]
    async fn get_unknown_id_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dispatch_batch_is_fifo_and_respects_limit() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let t = store
                .insert(new_task(TaskType::CpuIntensive, 1))
                .await
                .unwrap();
            ids.push(t.id);
        }

        let now = chrono::Utc::now();
        let dispatched = store.dispatch_batch(3, now).await.unwrap();

        // Oldest three, in insertion order.
        assert_eq!(dispatched.len(), 3);
        let dispatched_ids: Vec<_> = dispatched.iter().map(|t| t.id).collect();
        assert_eq!(dispatched_ids, ids[..3].to_vec());
        for t in &dispatched {
            assert_eq!(t.status, TaskStatus::Dispatched);
            assert_eq!(t.dispatched_at, Some(now));
        }

        // The rest stay pending.
        for id in &ids[3..] {
            let t = store.get(*id).await.unwrap().unwrap();
            assert_eq!(t.status, TaskStatus::Pending);
        }
    }

    #[tokio::test]
    async fn dispatch_batch_returns_empty_when_no_pending() {
        let store = MemoryStore::new();
        let dispatched = store.dispatch_batch(10, chrono::Utc::now()).await.unwrap();
        assert!(dispatched.is_empty());
    }

    #[tokio::test]
    async fn claim_batch_filters_by_task_type() {
        let store = MemoryStore::new();
        let cpu = store
            .insert(new_task(TaskType::CpuIntensive, 1))
            .await
            .unwrap();
        let mem = store
            .insert(new_task(TaskType::MemoryIntensive, 1))
            .await
            .unwrap();
        store.dispatch_batch(10, chrono::Utc::now()).await.unwrap();

        let now = chrono::Utc::now();
        let claimed = store
            .claim_batch(TaskType::CpuIntensive, 10, now)
            .await
            .unwrap();

        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, cpu.id);
        assert_eq!(claimed[0].status, TaskStatus::Running);
        assert_eq!(claimed[0].started_at, Some(now));

        let mem_row = store.get(mem.id).await.unwrap().unwrap();
        assert_eq!(mem_row.status, TaskStatus::Dispatched);
    }

    #[tokio::test]
    async fn claim_batch_ignores_pending_rows() {
        let store = MemoryStore::new();
        store
            .insert(new_task(TaskType::CpuIntensive, 1))
            .await
            .unwrap();

        let claimed = store
            .claim_batch(TaskType::CpuIntensive, 10, chrono::Utc::now())
            .await
            .unwrap();
        assert!(claimed.is_empty());
    }

    #[tokio::test]
    async fn finalize_success_clears_error_message() {
        let store = MemoryStore::new();
        let task = store
            .insert(new_task(TaskType::CpuIntensive, 1))
            .await
            .unwrap();
        store.dispatch_batch(1, chrono::Utc::now()).await.unwrap();
        store
            .claim_batch(TaskType::CpuIntensive, 1, chrono::Utc::now())
            .await
            .unwrap();

        let finished = chrono::Utc::now();
        let applied = store
            .finalize(&TaskOutcome::success(task.id, finished))
            .await
            .unwrap();
        assert!(applied);

        let row = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(row.status, TaskStatus::Completed);
        assert_eq!(row.finished_at, Some(finished));
        assert!(row.error_message.is_none());
    }

    #[tokio::test]
    async fn finalize_failure_records_error_message() {
        let store = MemoryStore::new();
        let task = store
            .insert(new_task(TaskType::MemoryIntensive, 1))
            .await
            .unwrap();
        store.dispatch_batch(1, chrono::Utc::now()).await.unwrap();
        store
            .claim_batch(TaskType::MemoryIntensive, 1, chrono::Utc::now())
            .await
            .unwrap();

        let applied = store
            .finalize(&TaskOutcome::failure(task.id, "boom", chrono::Utc::now()))
            .await
            .unwrap();
        assert!(applied);

        let row = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(row.status, TaskStatus::Failed);
        assert_eq!(row.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn finalize_vanished_row_returns_false() {
        let store = MemoryStore::new();
        let applied = store
            .finalize(&TaskOutcome::success(Uuid::new_v4(), chrono::Utc::now()))
            .await
            .unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for _ in 0..4 {
            let t = store
                .insert(new_task(TaskType::CpuIntensive, 1))
                .await
                .unwrap();
            ids.push(t.id);
        }

        let page = store.list(1, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        // Newest first: skipping one lands on the second-newest.
        assert_eq!(page[0].id, ids[2]);
        assert_eq!(page[1].id, ids[1]);
    }

    #[tokio::test]
    async fn truncate_empties_the_table() {
        let store = MemoryStore::new();
        store
            .insert(new_task(TaskType::CpuIntensive, 1))
            .await
            .unwrap();
        store.truncate().await.unwrap();
        assert!(store.snapshot().await.unwrap().is_empty());
    }
}
