//! Task dispatcher.
//!
//! Polls for `PENDING` tasks on a fixed interval and promotes them to
//! `DISPATCHED` in FIFO batches. The batch transition is one atomic
//! store operation: a failure dispatches nothing and the next tick
//! simply retries. There is no backoff and no dead-lettering; the loop
//! runs until cancelled.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use taskbench_db::store::{StoreError, TaskStore};

use crate::config::DispatcherConfig;

/// Background dispatcher: one long-lived task that promotes newly
/// created work into the dispatchable state.
pub struct Dispatcher {
    store: Arc<dyn TaskStore>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn TaskStore>, config: DispatcherConfig) -> Self {
        Self { store, config }
    }

    /// One dispatch cycle. Transitions up to `batch_size` of the oldest
    /// pending tasks and returns how many were promoted.
    pub async fn dispatch_batch(&self) -> Result<usize, StoreError> {
        let dispatched = self
            .store
            .dispatch_batch(self.config.batch_size, chrono::Utc::now())
            .await?;

        if !dispatched.is_empty() {
            tracing::info!(count = dispatched.len(), "Dispatched task batch");
        }

        Ok(dispatched.len())
    }

    /// Run the dispatcher loop until the cancellation token fires.
    ///
    /// The tick rate is fixed regardless of whether work was found;
    /// store errors are logged and retried on the next tick.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            "Dispatcher started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.dispatch_batch().await {
                        tracing::error!(error = %e, "Dispatch cycle failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use taskbench_core::types::TaskId;
    use taskbench_db::models::{NewTask, TaskStatus, TaskType};
    use taskbench_db::store::MemoryStore;

    use super::*;

    async fn seed(store: &MemoryStore, n: usize) -> Vec<TaskId> {
        let mut ids = Vec::new();
        for _ in 0..n {
            let t = store
                .insert(NewTask {
                    task_type: TaskType::CpuIntensive,
                    complexity: 1,
                    expected_duration_sec: None,
                    payload_size_kb: None,
                })
                .await
                .unwrap();
            ids.push(t.id);
        }
        ids
    }

    #[tokio::test]
    async fn dispatches_oldest_first_up_to_limit() {
        let store = Arc::new(MemoryStore::new());
        let ids = seed(&store, 5).await;

        let dispatcher = Dispatcher::new(
            store.clone(),
            DispatcherConfig {
                batch_size: 3,
                ..DispatcherConfig::default()
            },
        );

        let count = dispatcher.dispatch_batch().await.unwrap();
        assert_eq!(count, 3);

        for (i, id) in ids.iter().enumerate() {
            let task = store.get(*id).await.unwrap().unwrap();
            if i < 3 {
                assert_eq!(task.status, TaskStatus::Dispatched);
                let dispatched_at = task.dispatched_at.expect("dispatched_at must be set");
                assert!(task.created_at <= dispatched_at);
            } else {
                assert_eq!(task.status, TaskStatus::Pending);
                assert!(task.dispatched_at.is_none());
            }
        }
    }

    #[tokio::test]
    async fn empty_store_dispatches_nothing() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(store, DispatcherConfig::default());
        assert_eq!(dispatcher.dispatch_batch().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn repeated_cycles_drain_the_backlog() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, 7).await;

        let dispatcher = Dispatcher::new(
            store.clone(),
            DispatcherConfig {
                batch_size: 3,
                ..DispatcherConfig::default()
            },
        );

        assert_eq!(dispatcher.dispatch_batch().await.unwrap(), 3);
        assert_eq!(dispatcher.dispatch_batch().await.unwrap(), 3);
        assert_eq!(dispatcher.dispatch_batch().await.unwrap(), 1);
        assert_eq!(dispatcher.dispatch_batch().await.unwrap(), 0);
    }
}
