//! On-demand statistics over the task table.
//!
//! Every call is a fresh full-table aggregation; nothing is cached or
//! maintained incrementally. Averages distinguish "no data" from zero:
//! an empty input set yields `null`, never `0.0`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use taskbench_core::types::Timestamp;
use taskbench_db::models::{Task, TaskStatus, TaskType};
use taskbench_db::store::{StoreError, TaskStore};

/// Aggregated statistics for `GET /stats/summary`.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_tasks: u64,
    /// Counts keyed by status; only statuses with at least one task
    /// appear.
    pub status_counts: BTreeMap<TaskStatus, u64>,
    /// Mean of `started_at - created_at` over tasks that have begun
    /// executing, in seconds. `null` when no task has started yet.
    pub avg_wait_time_sec: Option<f64>,
    /// Mean of `finished_at - started_at` per workload class, over
    /// every task with both timestamps set (failed runs included).
    /// Both classes always appear, `null` when a class has no finished
    /// runs.
    pub avg_run_time_sec_by_type: BTreeMap<TaskType, Option<f64>>,
    /// Completions per minute over the observed completion window.
    /// `null` when the window is empty or zero-width (a lone
    /// completion, or all at the identical instant).
    pub throughput_tasks_per_min: Option<f64>,
}

/// Computes summaries from a full store snapshot.
pub struct StatsAggregator {
    store: Arc<dyn TaskStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn summarize(&self) -> Result<Summary, StoreError> {
        let tasks = self.store.snapshot().await?;
        Ok(summarize_tasks(&tasks))
    }
}

fn summarize_tasks(tasks: &[Task]) -> Summary {
    let mut status_counts: BTreeMap<TaskStatus, u64> = BTreeMap::new();
    for task in tasks {
        *status_counts.entry(task.status).or_insert(0) += 1;
    }

    let wait_times: Vec<f64> = tasks
        .iter()
        .filter_map(|t| t.started_at.map(|s| span_secs(t.created_at, s)))
        .collect();

    let mut avg_run_time_sec_by_type = BTreeMap::new();
    for task_type in TaskType::ALL {
        let run_times: Vec<f64> = tasks
            .iter()
            .filter(|t| t.task_type == task_type)
            .filter_map(|t| match (t.started_at, t.finished_at) {
                (Some(s), Some(f)) => Some(span_secs(s, f)),
                _ => None,
            })
            .collect();
        avg_run_time_sec_by_type.insert(task_type, mean(&run_times));
    }

    Summary {
        total_tasks: tasks.len() as u64,
        status_counts,
        avg_wait_time_sec: mean(&wait_times),
        avg_run_time_sec_by_type,
        throughput_tasks_per_min: throughput_per_min(tasks),
    }
}

/// Completions per minute over the first-to-last completion window.
///
/// `None` unless at least two distinct completion instants exist; a
/// single completion has a zero-width window and no meaningful rate.
fn throughput_per_min(tasks: &[Task]) -> Option<f64> {
    let finished: Vec<Timestamp> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .filter_map(|t| t.finished_at)
        .collect();

    let first = finished.iter().min()?;
    let last = finished.iter().max()?;
    let span = span_secs(*first, *last);
    if span <= 0.0 {
        return None;
    }
    Some(finished.len() as f64 / span * 60.0)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Signed span between two instants in seconds, at sub-millisecond
/// precision. Falls back to millisecond precision on the (centuries-
/// wide) spans that overflow a nanosecond count.
fn span_secs(from: Timestamp, to: Timestamp) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}
