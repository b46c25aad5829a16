//! Synthetic CPU and memory workloads.
//!
//! Pure functions used by the execution engines to produce measurable,
//! tunable load. Both routines scale linearly with `complexity` so load
//! test runs stay repeatable; neither performs any I/O.

use std::hint::black_box;

/// Iterations of the arithmetic recurrence per unit of complexity.
const CPU_ITERATIONS_PER_UNIT: u64 = 100_000;

/// Byte stride used when touching the allocated block. One touch per
/// (typical) page defeats lazy-allocation optimizations.
const MEMORY_TOUCH_STRIDE: usize = 4096;

/// Upper bound on the memory workload's working set. Requests above this
/// are rejected as task failures rather than risking an allocator abort.
pub const MAX_MEMORY_COMPLEXITY_MB: i32 = 16_384;

/// Burn CPU with a deterministic floating-point recurrence.
///
/// Runs `max(1, complexity) * 100_000` iterations of
/// `x = (x * i + 1.2345) % 123456.789`. The result is routed through
/// [`black_box`] so the loop cannot be folded away.
pub fn simulate_cpu_load(complexity: i32) {
    let iterations = complexity.max(1) as u64 * CPU_ITERATIONS_PER_UNIT;
    let mut x = 0.001_f64;
    for i in 0..iterations {
        x = (x * i as f64 + 1.2345) % 123_456.789;
    }
    black_box(x);
}

/// Allocate `max(1, complexity)` MiB and touch every 4096th byte.
///
/// Returns an error instead of allocating when the requested working set
/// exceeds [`MAX_MEMORY_COMPLEXITY_MB`], and reports allocator refusals
/// the same way; either is a task-level failure, not a process abort.
pub fn simulate_memory_load(complexity: i32) -> Result<(), String> {
    let size_mb = complexity.max(1);
    if size_mb > MAX_MEMORY_COMPLEXITY_MB {
        return Err(format!(
            "memory workload of {size_mb} MiB exceeds the {MAX_MEMORY_COMPLEXITY_MB} MiB cap"
        ));
    }

    let mut block = allocate_block(size_mb as usize * 1024 * 1024)?;
    let mut i = 0;
    while i < block.len() {
        block[i] = block[i].wrapping_add(1);
        i += MEMORY_TOUCH_STRIDE;
    }
    black_box(&block);
    Ok(())
}

/// Fallible zeroed allocation. `vec![0; n]` would abort the process on
/// allocator failure, taking every in-flight sibling task with it;
/// `try_reserve_exact` surfaces the refusal as an `Err` instead.
fn allocate_block(size_bytes: usize) -> Result<Vec<u8>, String> {
    let mut block = Vec::new();
    block
        .try_reserve_exact(size_bytes)
        .map_err(|e| format!("failed to allocate {size_bytes} byte working set: {e}"))?;
    block.resize(size_bytes, 0);
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_load_terminates_for_minimum_complexity() {
        simulate_cpu_load(1);
    }

    #[test]
    fn cpu_load_clamps_non_positive_complexity() {
        // complexity <= 0 is treated as 1, not as an empty loop.
        simulate_cpu_load(0);
        simulate_cpu_load(-5);
    }

    #[test]
    fn memory_load_touches_small_block() {
        assert!(simulate_memory_load(1).is_ok());
    }

    #[test]
    fn memory_load_clamps_non_positive_complexity() {
        assert!(simulate_memory_load(0).is_ok());
    }

    #[test]
    fn memory_load_rejects_oversized_request() {
        let err = simulate_memory_load(MAX_MEMORY_COMPLEXITY_MB + 1).unwrap_err();
        assert!(err.contains("cap"));
    }

    #[test]
    fn allocation_refusal_is_an_error_not_an_abort() {
        // usize::MAX can never be reserved; the failure must come back
        // as Err rather than killing the process.
        let err = allocate_block(usize::MAX).unwrap_err();
        assert!(err.contains("failed to allocate"));
    }
}
