use std::collections::HashSet;
use std::time::Duration;

use taskbench_pipeline::{DispatcherConfig, EngineConfig};

/// Pipeline roles the worker binary can run.
///
/// One process can host any subset; the claim protocol assumes at most
/// one active instance of each role across the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Dispatcher,
    CpuEngine,
    MemoryEngine,
}

/// Worker configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Roles this process runs, parsed from comma-separated
    /// `WORKER_ROLES` (default: all three).
    pub roles: HashSet<Role>,
    pub dispatcher: DispatcherConfig,
    pub cpu_engine: EngineConfig,
    pub memory_engine: EngineConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                   |
    /// |------------------------------|---------------------------|
    /// | `WORKER_ROLES`               | `dispatcher,cpu,memory`   |
    /// | `DISPATCH_INTERVAL_MS`       | `1000`                    |
    /// | `DISPATCH_BATCH_SIZE`        | `10`                      |
    /// | `CPU_BATCH_SIZE`             | `50`                      |
    /// | `CPU_WORKER_CONCURRENCY`     | `8`                       |
    /// | `CPU_IDLE_POLL_SECS`         | `5`                       |
    /// | `MEMORY_BATCH_SIZE`          | `5`                       |
    /// | `MEMORY_WORKER_CONCURRENCY`  | `2`                       |
    /// | `MEMORY_IDLE_POLL_SECS`      | `1`                       |
    pub fn from_env() -> Self {
        let roles = std::env::var("WORKER_ROLES")
            .unwrap_or_else(|_| "dispatcher,cpu,memory".into())
            .split(',')
            .filter_map(|s| match s.trim() {
                "dispatcher" => Some(Role::Dispatcher),
                "cpu" => Some(Role::CpuEngine),
                "memory" => Some(Role::MemoryEngine),
                "" => None,
                other => {
                    // Fail fast: a typo here would silently drop a role.
                    panic!("Unknown worker role '{other}' in WORKER_ROLES");
                }
            })
            .collect();

        let dispatcher_defaults = DispatcherConfig::default();
        let dispatcher = DispatcherConfig {
            poll_interval: Duration::from_millis(env_parse("DISPATCH_INTERVAL_MS", 1000)),
            batch_size: env_parse("DISPATCH_BATCH_SIZE", dispatcher_defaults.batch_size),
        };

        let cpu_defaults = EngineConfig::cpu_defaults();
        let cpu_engine = EngineConfig {
            batch_size: env_parse("CPU_BATCH_SIZE", cpu_defaults.batch_size),
            worker_concurrency: env_parse("CPU_WORKER_CONCURRENCY", cpu_defaults.worker_concurrency),
            idle_poll_interval: Duration::from_secs(env_parse("CPU_IDLE_POLL_SECS", 5)),
            ..cpu_defaults
        };

        let memory_defaults = EngineConfig::memory_defaults();
        let memory_engine = EngineConfig {
            batch_size: env_parse("MEMORY_BATCH_SIZE", memory_defaults.batch_size),
            worker_concurrency: env_parse(
                "MEMORY_WORKER_CONCURRENCY",
                memory_defaults.worker_concurrency,
            ),
            idle_poll_interval: Duration::from_secs(env_parse("MEMORY_IDLE_POLL_SECS", 1)),
            ..memory_defaults
        };

        Self {
            roles,
            dispatcher,
            cpu_engine,
            memory_engine,
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset.
fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{var} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
