//! Structured observability hooks for review-queue events.
//!
//! This module provides:
//! - Queue-scoped tracing spans via the `QueueSpan` RAII guard
//! - Emission functions for key events: run triaged, queue built, review
//!   action recorded, dataset loaded
//!
//! Per-run events are emitted at `debug!`, everything else at `info!`
//! (filter with `RUST_LOG`). For JSON output, pass `--json` to the CLI.

use tracing::{debug, info};

/// RAII guard that enters a queue-scoped tracing span while a queue is built.
///
/// # Example
///
/// ```ignore
/// let _span = QueueSpan::enter(runs.len());
/// // tracing calls made here carry run_count
/// ```
pub struct QueueSpan {
    _span: tracing::span::EnteredSpan,
}

impl QueueSpan {
    /// Create and enter a span tagged with the number of runs evaluated.
    pub fn enter(run_count: usize) -> Self {
        let span = tracing::info_span!("certq.queue", run_count = run_count);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: one run was classified.
pub fn emit_run_triaged(run_id: &str, decision: &str, ci_avg: f64) {
    debug!(event = "run.triaged", run_id = %run_id, decision = %decision, ci_avg = ci_avg);
}

/// Emit event: a review queue was built.
pub fn emit_queue_built(
    evaluated: usize,
    queued: usize,
    borderline: usize,
    sampled: usize,
    floor_excluded: usize,
) {
    info!(
        event = "queue.built",
        evaluated = evaluated,
        queued = queued,
        borderline = borderline,
        sampled = sampled,
        floor_excluded = floor_excluded,
    );
}

/// Emit event: a reviewer action was handed to a sink.
pub fn emit_review_action(run_id: &str, action: &str, reviewer: &str) {
    info!(event = "review.action", run_id = %run_id, action = %action, reviewer = %reviewer);
}

/// Emit event: a dataset was loaded from disk.
pub fn emit_dataset_loaded(source: &str, runs: usize, devices: usize, tests: usize) {
    info!(
        event = "dataset.loaded",
        source = %source,
        runs = runs,
        devices = devices,
        tests = tests,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_span_create() {
        // Just ensure QueueSpan::enter doesn't panic
        let _span = QueueSpan::enter(3);
        emit_run_triaged("RUN-1", "auto_pass", 0.9);
    }
}
