//! Bounded-concurrency workload execution with pluggable isolation.
//!
//! A unit of work is purely `(complexity) -> Result<(), String>`; it
//! never touches the store. The executor bounds parallelism with a
//! semaphore and converts panics inside a unit into failed results so
//! one bad task cannot abort its batch siblings.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::{oneshot, Semaphore};

use taskbench_core::workload::{simulate_cpu_load, simulate_memory_load};

/// A simulated (or injected) task workload.
///
/// Implementations must be pure with respect to the store: the driving
/// loop alone writes task state.
pub trait Workload: Send + Sync + 'static {
    fn run(&self, complexity: i32) -> Result<(), String>;
}

/// The CPU-class workload: a deterministic numeric loop linear in
/// `complexity`.
pub struct CpuWorkload;

impl Workload for CpuWorkload {
    fn run(&self, complexity: i32) -> Result<(), String> {
        simulate_cpu_load(complexity);
        Ok(())
    }
}

/// The memory-class workload: allocate-and-touch, linear in
/// `complexity` MiB.
pub struct MemoryWorkload;

impl Workload for MemoryWorkload {
    fn run(&self, complexity: i32) -> Result<(), String> {
        simulate_memory_load(complexity)
    }
}

/// How a unit of work is isolated from the async runtime.
///
/// `DedicatedThread` gives every unit a fresh OS thread with its own
/// stack, keeping hot numeric loops fully off shared executor threads
/// (the role a process pool plays in runtimes with an interpreter
/// lock). `BlockingPool` reuses tokio's blocking threads, which is
/// enough for allocation-dominated work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    DedicatedThread,
    BlockingPool,
}

/// Runs workloads under a fixed concurrency bound.
#[derive(Clone)]
pub struct BoundedExecutor {
    isolation: Isolation,
    permits: Arc<Semaphore>,
}

impl BoundedExecutor {
    pub fn new(isolation: Isolation, concurrency: usize) -> Self {
        Self {
            isolation,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Run one unit of work, waiting for a pool slot first.
    ///
    /// A panic inside the workload is caught and reported as `Err`;
    /// it never propagates to the caller.
    pub async fn execute(
        &self,
        workload: Arc<dyn Workload>,
        complexity: i32,
    ) -> Result<(), String> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| "executor shut down".to_string())?;

        let result = match self.isolation {
            Isolation::BlockingPool => {
                let handle =
                    tokio::task::spawn_blocking(move || workload.run(complexity));
                match handle.await {
                    Ok(result) => result,
                    Err(join_err) if join_err.is_panic() => {
                        Err(panic_message(join_err.into_panic()))
                    }
                    Err(join_err) => Err(format!("workload task aborted: {join_err}")),
                }
            }
            Isolation::DedicatedThread => {
                let (tx, rx) = oneshot::channel();
                let spawned = std::thread::Builder::new()
                    .name("taskbench-workload".to_string())
                    .spawn(move || {
                        let result = catch_unwind(AssertUnwindSafe(|| workload.run(complexity)))
                            .unwrap_or_else(|payload| Err(panic_message(payload)));
                        let _ = tx.send(result);
                    });
                match spawned {
                    Ok(_) => rx
                        .await
                        .unwrap_or_else(|_| Err("workload thread disconnected".to_string())),
                    Err(e) => Err(format!("failed to spawn workload thread: {e}")),
                }
            }
        };

        drop(permit);
        result
    }
}

/// Extract a readable message from a panic payload.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "workload panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    struct PanickingWorkload;

    impl Workload for PanickingWorkload {
        fn run(&self, _complexity: i32) -> Result<(), String> {
            panic!("deliberate panic");
        }
    }

    /// Records the high-water mark of concurrently running units.
    struct ConcurrencyProbe {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ConcurrencyProbe {
        fn new() -> Self {
            Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl Workload for Arc<ConcurrencyProbe> {
        fn run(&self, _complexity: i32) -> Result<(), String> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn panic_in_dedicated_thread_becomes_error() {
        let executor = BoundedExecutor::new(Isolation::DedicatedThread, 1);
        let err = executor
            .execute(Arc::new(PanickingWorkload), 1)
            .await
            .unwrap_err();
        assert!(err.contains("deliberate panic"));
    }

    #[tokio::test]
    async fn panic_in_blocking_pool_becomes_error() {
        let executor = BoundedExecutor::new(Isolation::BlockingPool, 1);
        let err = executor
            .execute(Arc::new(PanickingWorkload), 1)
            .await
            .unwrap_err();
        assert!(err.contains("deliberate panic"));
    }

    #[tokio::test]
    async fn concurrency_stays_within_the_bound() {
        let executor = BoundedExecutor::new(Isolation::DedicatedThread, 2);
        let probe = Arc::new(ConcurrencyProbe::new());

        let units = (0..6).map(|_| {
            let executor = executor.clone();
            let workload: Arc<dyn Workload> = Arc::new(Arc::clone(&probe));
            async move { executor.execute(workload, 1).await }
        });
        let results = futures::future::join_all(units).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert!(probe.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn cpu_workload_completes() {
        let executor = BoundedExecutor::new(Isolation::DedicatedThread, 1);
        executor.execute(Arc::new(CpuWorkload), 1).await.unwrap();
    }

    #[tokio::test]
    async fn memory_workload_completes() {
        let executor = BoundedExecutor::new(Isolation::BlockingPool, 1);
        executor.execute(Arc::new(MemoryWorkload), 1).await.unwrap();
    }
}
