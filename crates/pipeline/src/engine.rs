//! Execution engine: claim, execute, finalize.
//!
//! One engine instance serves one workload class. The claim (batch
//! `DISPATCHED -> RUNNING`) is the ownership grant: once it commits,
//! the rows belong to this instance. Execution runs under a bounded
//! pool and never writes to the store; finalization commits one row at
//! a time so a bad row cannot block its siblings. A workload failure is
//! a terminal *task* state, never a pipeline error.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use taskbench_db::models::{Task, TaskOutcome, TaskType};
use taskbench_db::store::{StoreError, TaskStore};

use crate::config::EngineConfig;
use crate::executor::{BoundedExecutor, CpuWorkload, Isolation, MemoryWorkload, Workload};

/// Polling execution engine for a single workload class.
pub struct ExecutionEngine {
    store: Arc<dyn TaskStore>,
    task_type: TaskType,
    workload: Arc<dyn Workload>,
    executor: BoundedExecutor,
    config: EngineConfig,
}

impl ExecutionEngine {
    /// CPU-class engine: dedicated-thread isolation, numeric-loop workload.
    pub fn cpu(store: Arc<dyn TaskStore>, config: EngineConfig) -> Self {
        Self::with_workload(
            store,
            TaskType::CpuIntensive,
            Arc::new(CpuWorkload),
            Isolation::DedicatedThread,
            config,
        )
    }

    /// Memory-class engine: blocking-pool isolation, allocate-and-touch
    /// workload.
    pub fn memory(store: Arc<dyn TaskStore>, config: EngineConfig) -> Self {
        Self::with_workload(
            store,
            TaskType::MemoryIntensive,
            Arc::new(MemoryWorkload),
            Isolation::BlockingPool,
            config,
        )
    }

    /// Fully parameterized constructor; the seam tests use to inject
    /// failing or instrumented workloads.
    pub fn with_workload(
        store: Arc<dyn TaskStore>,
        task_type: TaskType,
        workload: Arc<dyn Workload>,
        isolation: Isolation,
        config: EngineConfig,
    ) -> Self {
        let executor = BoundedExecutor::new(isolation, config.worker_concurrency);
        Self {
            store,
            task_type,
            workload,
            executor,
            config,
        }
    }

    /// One claim/execute/finalize cycle.
    ///
    /// Returns the number of tasks claimed, even if some of them later
    /// failed individually. Claimed tasks always reach exactly one
    /// terminal state: every workload error or panic is captured as a
    /// failed outcome and finalized like any other.
    pub async fn process_batch(&self) -> Result<usize, StoreError> {
        let claimed = self
            .store
            .claim_batch(self.task_type, self.config.batch_size, chrono::Utc::now())
            .await?;
        if claimed.is_empty() {
            return Ok(0);
        }

        tracing::info!(
            task_type = %self.task_type,
            count = claimed.len(),
            "Claimed task batch",
        );

        let outcomes = self.execute_all(&claimed).await;

        for outcome in &outcomes {
            match self.store.finalize(outcome).await {
                Ok(true) => {}
                Ok(false) => {
                    // Row deleted concurrently; nothing to record.
                    tracing::debug!(task_id = %outcome.task_id, "Task vanished before finalize");
                }
                Err(e) => {
                    // Sibling finalizations proceed; this row stays RUNNING.
                    tracing::error!(
                        task_id = %outcome.task_id,
                        error = %e,
                        "Failed to finalize task",
                    );
                }
            }
        }

        Ok(claimed.len())
    }

    /// Run every claimed task under the bounded pool and collect one
    /// outcome per task. Completion order across workers is unordered.
    async fn execute_all(&self, claimed: &[Task]) -> Vec<TaskOutcome> {
        let units = claimed.iter().map(|task| {
            let executor = self.executor.clone();
            let workload = Arc::clone(&self.workload);
            let task_id = task.id;
            let complexity = task.complexity;
            async move {
                let result = executor.execute(workload, complexity).await;
                let finished_at = chrono::Utc::now();
                match result {
                    Ok(()) => TaskOutcome::success(task_id, finished_at),
                    Err(message) => {
                        tracing::warn!(task_id = %task_id, error = %message, "Task workload failed");
                        TaskOutcome::failure(task_id, message, finished_at)
                    }
                }
            }
        });
        join_all(units).await
    }

    /// Run the engine loop until the cancellation token fires.
    ///
    /// Adaptive poll: sleep the short interval after a productive batch,
    /// the long one after an empty batch. Store errors are logged and
    /// treated like an empty batch.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            task_type = %self.task_type,
            batch_size = self.config.batch_size,
            worker_concurrency = self.config.worker_concurrency,
            "Execution engine started",
        );

        loop {
            let processed = match self.process_batch().await {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!(task_type = %self.task_type, error = %e, "Process cycle failed");
                    0
                }
            };

            let delay = if processed == 0 {
                self.config.idle_poll_interval
            } else {
                self.config.busy_poll_interval
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(task_type = %self.task_type, "Execution engine shutting down");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
