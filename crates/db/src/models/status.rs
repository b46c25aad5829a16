//! Task lifecycle and workload-class enums.
//!
//! Both enums serialize as SCREAMING_SNAKE_CASE strings in JSON and are
//! stored as TEXT in the `tasks` table, so the wire and storage formats
//! are identical.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Workload class of a task. Immutable after creation; selects which
/// execution engine may claim the task and how `complexity` is read
/// (iteration multiplier for CPU, MiB of working set for memory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    CpuIntensive,
    MemoryIntensive,
}

impl TaskType {
    /// All workload classes, in a stable order.
    pub const ALL: [TaskType; 2] = [TaskType::CpuIntensive, TaskType::MemoryIntensive];

    /// The wire/storage name of the class.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::CpuIntensive => "CPU_INTENSIVE",
            TaskType::MemoryIntensive => "MEMORY_INTENSIVE",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CPU_INTENSIVE" => Ok(TaskType::CpuIntensive),
            "MEMORY_INTENSIVE" => Ok(TaskType::MemoryIntensive),
            other => Err(format!("unknown task type: {other}")),
        }
    }
}

/// Lifecycle state of a task.
///
/// Transitions are monotonic: `Pending -> Dispatched -> Running ->
/// {Completed, Failed}`. No component may move a task backward. A task
/// whose owning worker dies while `Running` stays `Running` forever
/// (documented limitation; there is no lease/timeout sweep).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Dispatched,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// The wire/storage name of the state.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Dispatched => "DISPATCHED",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }

    /// Whether the state is terminal (no further transitions).
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "DISPATCHED" => Ok(TaskStatus::Dispatched),
            "RUNNING" => Ok(TaskStatus::Running),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "FAILED" => Ok(TaskStatus::Failed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}
