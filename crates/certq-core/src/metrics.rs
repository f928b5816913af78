//! Process-wide triage counters.
//!
//! The selector records every decision it makes; the CLI calls
//! [`Metrics::flush`] once before exiting. Borderline entries are split by
//! trigger so a run queued for both `WARN` and low CI counts under each flag
//! but only once in `queued`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::triage::{ReviewReason, TriageDecision};

pub static METRICS: Metrics = Metrics::new();

#[derive(Debug)]
pub struct Metrics {
    runs_evaluated: AtomicU64,
    auto_passed: AtomicU64,
    floor_excluded: AtomicU64,
    queued_borderline: AtomicU64,
    borderline_warn: AtomicU64,
    borderline_below_auto_pass: AtomicU64,
    queued_sampled: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub runs_evaluated: u64,
    pub auto_passed: u64,
    pub floor_excluded: u64,
    pub queued_borderline: u64,
    pub borderline_warn: u64,
    pub borderline_below_auto_pass: u64,
    pub queued_sampled: u64,
}

impl MetricsSnapshot {
    pub fn queued(&self) -> u64 {
        self.queued_borderline + self.queued_sampled
    }

    /// Queued runs as a percentage of evaluated runs; 0 before any run.
    pub fn review_rate(&self) -> f64 {
        if self.runs_evaluated == 0 {
            return 0.0;
        }
        self.queued() as f64 * 100.0 / self.runs_evaluated as f64
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            runs_evaluated: AtomicU64::new(0),
            auto_passed: AtomicU64::new(0),
            floor_excluded: AtomicU64::new(0),
            queued_borderline: AtomicU64::new(0),
            borderline_warn: AtomicU64::new(0),
            borderline_below_auto_pass: AtomicU64::new(0),
            queued_sampled: AtomicU64::new(0),
        }
    }

    /// Count one triage decision.
    pub fn record(&self, decision: &TriageDecision) {
        self.runs_evaluated.fetch_add(1, Ordering::Relaxed);
        match decision {
            TriageDecision::FloorExcluded => bump(&self.floor_excluded),
            TriageDecision::AutoPass => bump(&self.auto_passed),
            TriageDecision::Review(ReviewReason::Borderline {
                warn,
                below_auto_pass,
            }) => {
                bump(&self.queued_borderline);
                if *warn {
                    bump(&self.borderline_warn);
                }
                if *below_auto_pass {
                    bump(&self.borderline_below_auto_pass);
                }
            }
            TriageDecision::Review(ReviewReason::Sampled { .. }) => bump(&self.queued_sampled),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_evaluated: self.runs_evaluated.load(Ordering::Relaxed),
            auto_passed: self.auto_passed.load(Ordering::Relaxed),
            floor_excluded: self.floor_excluded.load(Ordering::Relaxed),
            queued_borderline: self.queued_borderline.load(Ordering::Relaxed),
            borderline_warn: self.borderline_warn.load(Ordering::Relaxed),
            borderline_below_auto_pass: self.borderline_below_auto_pass.load(Ordering::Relaxed),
            queued_sampled: self.queued_sampled.load(Ordering::Relaxed),
        }
    }

    /// Emit the counters as one `info!` event. Silent when nothing was triaged.
    pub fn flush(&self) {
        let s = self.snapshot();
        if s.runs_evaluated == 0 {
            return;
        }
        tracing::info!(
            event = "metrics.flush",
            runs_evaluated = s.runs_evaluated,
            queued = s.queued(),
            review_rate_pct = s.review_rate(),
            auto_passed = s.auto_passed,
            floor_excluded = s.floor_excluded,
            borderline = s.queued_borderline,
            borderline_warn = s.borderline_warn,
            borderline_below_auto_pass = s.borderline_below_auto_pass,
            sampled = s.queued_sampled,
        );
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}
