//! Polling configuration for the pipeline loops.
//!
//! Explicit structs passed in at startup, not ambient globals. The
//! worker binary builds these from environment variables; defaults
//! match the tuning the load harness was calibrated against.

use std::time::Duration;

/// Configuration for the dispatcher loop.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Fixed poll interval; the dispatcher ticks at this rate whether or
    /// not the previous tick found work.
    pub poll_interval: Duration,
    /// Maximum tasks promoted per tick.
    pub batch_size: i64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 10,
        }
    }
}

/// Configuration for an execution engine loop.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum tasks claimed per batch.
    pub batch_size: i64,
    /// Bounded-parallelism pool size for the execute phase.
    pub worker_concurrency: usize,
    /// Sleep after a batch that processed zero tasks.
    pub idle_poll_interval: Duration,
    /// Sleep after a batch that processed at least one task.
    pub busy_poll_interval: Duration,
}

impl EngineConfig {
    /// Defaults for the CPU-class engine: large batches, wide pool.
    pub fn cpu_defaults() -> Self {
        Self {
            batch_size: 50,
            worker_concurrency: 8,
            idle_poll_interval: Duration::from_secs(5),
            busy_poll_interval: Duration::from_millis(10),
        }
    }

    /// Defaults for the memory-class engine: small batches so the
    /// working sets of concurrent units stay bounded.
    pub fn memory_defaults() -> Self {
        Self {
            batch_size: 5,
            worker_concurrency: 2,
            idle_poll_interval: Duration::from_secs(1),
            busy_poll_interval: Duration::from_millis(10),
        }
    }
}
