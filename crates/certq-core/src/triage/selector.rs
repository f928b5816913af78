//! Review-queue selection: which runs a human has to look at, and why.

use serde::{Deserialize, Serialize};

use crate::domain::run::{Run, RunStatus};
use crate::domain::validation::validate_runs;
use crate::metrics::METRICS;
use crate::obs;

use super::error::TriageResult;
use super::policy::TriagePolicy;
use super::sampling::deterministic_sample_percent;

/// Why a run was put in front of a reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewReason {
    /// Inside the discretionary band, or flagged `WARN` by the executor.
    Borderline {
        /// The run's status is `WARN`.
        warn: bool,
        /// The run's CI is below the auto-pass threshold.
        below_auto_pass: bool,
    },
    /// Would auto-pass, but its sampling bucket fell under the sample share.
    Sampled {
        /// `deterministic_sample_percent(run_id)`.
        bucket: u8,
    },
}

impl ReviewReason {
    /// Short label for display (`borderline` / `sampled`).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Borderline { .. } => "borderline",
            Self::Sampled { .. } => "sampled",
        }
    }
}

/// Triage outcome for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum TriageDecision {
    /// Below the review floor: treated as a clear fail, no review.
    FloorExcluded,
    /// At or above the auto-pass threshold, not `WARN`, not sampled.
    AutoPass,
    /// Needs human review.
    Review(ReviewReason),
}

impl TriageDecision {
    /// Whether the run belongs in the review queue.
    pub fn needs_review(&self) -> bool {
        matches!(self, Self::Review(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::FloorExcluded => "floor_excluded",
            Self::AutoPass => "auto_pass",
            Self::Review(reason) => reason.label(),
        }
    }
}

/// Classify one run against `policy`.
///
/// Pure and independent of every other run. Does not validate; callers that
/// accept untrusted data go through [`build_review_queue`].
pub fn classify_run(run: &Run, policy: &TriagePolicy) -> TriageDecision {
    // Sampling never reaches below the floor.
    if run.ci_avg < policy.review_floor {
        return TriageDecision::FloorExcluded;
    }

    let warn = run.status == RunStatus::Warn;
    let below_auto_pass = run.ci_avg < policy.auto_pass_threshold;
    if warn || below_auto_pass {
        return TriageDecision::Review(ReviewReason::Borderline {
            warn,
            below_auto_pass,
        });
    }

    let bucket = deterministic_sample_percent(&run.run_id);
    if bucket < policy.sample_percent {
        return TriageDecision::Review(ReviewReason::Sampled { bucket });
    }

    TriageDecision::AutoPass
}

/// A queued run with the reason it was queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub run: Run,
    pub reason: ReviewReason,
}

/// The computed review queue.
///
/// `entries` keeps the relative order of the input runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewQueue {
    /// Policy the queue was computed with.
    pub policy: TriagePolicy,
    /// Queued runs in input order.
    pub entries: Vec<QueueEntry>,
    /// Number of runs evaluated.
    pub evaluated: usize,
    /// Number of runs dropped by the review floor.
    pub floor_excluded: usize,
}

impl ReviewQueue {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries queued as borderline.
    pub fn borderline_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.reason, ReviewReason::Borderline { .. }))
            .count()
    }

    /// Number of entries queued by sampling.
    pub fn sampled_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.reason, ReviewReason::Sampled { .. }))
            .count()
    }

    /// Queued run ids in order.
    pub fn run_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.run.run_id.as_str()).collect()
    }

    /// Whether `run_id` is queued.
    pub fn contains(&self, run_id: &str) -> bool {
        self.entries.iter().any(|e| e.run.run_id == run_id)
    }

    /// Consume the queue, keeping only the runs.
    pub fn into_runs(self) -> Vec<Run> {
        self.entries.into_iter().map(|e| e.run).collect()
    }
}

/// Build the review queue for `runs` under `policy`.
///
/// The policy is checked before any run is looked at. The batch is then
/// validated as a whole: one bad record fails the call, so no run that
/// needs review can be silently dropped.
///
/// # Errors
///
/// - `TriageError::Configuration`: the policy is out of range.
/// - `TriageError::DataValidation`: a run breaks an invariant or an id repeats.
pub fn build_review_queue(runs: &[Run], policy: &TriagePolicy) -> TriageResult<ReviewQueue> {
    policy.validate()?;
    validate_runs(runs)?;

    let _span = obs::QueueSpan::enter(runs.len());

    let mut entries = Vec::new();
    let mut floor_excluded = 0;
    for run in runs {
        let decision = classify_run(run, policy);
        METRICS.record(&decision);
        obs::emit_run_triaged(&run.run_id, decision.label(), run.ci_avg);

        match decision {
            TriageDecision::FloorExcluded => floor_excluded += 1,
            TriageDecision::AutoPass => {}
            TriageDecision::Review(reason) => {
                entries.push(QueueEntry {
                    run: run.clone(),
                    reason,
                });
            }
        }
    }

    let queue = ReviewQueue {
        policy: *policy,
        entries,
        evaluated: runs.len(),
        floor_excluded,
    };
    obs::emit_queue_built(
        queue.evaluated,
        queue.len(),
        queue.borderline_count(),
        queue.sampled_count(),
        queue.floor_excluded,
    );
    Ok(queue)
}

/// Runs that require human review, in input order.
pub fn select_for_review(runs: &[Run], policy: &TriagePolicy) -> TriageResult<Vec<Run>> {
    Ok(build_review_queue(runs, policy)?.into_runs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ValidationError;
    use crate::triage::error::TriageError;

    fn run(id: &str, status: RunStatus, ci: f64) -> Run {
        Run::new(id, "Fujitsu fi-7160", status, ci, 40, "2025-08-22 09:42")
    }

    #[test]
    fn test_classify_floor_excluded_regardless_of_status() {
        let policy = TriagePolicy::default();
        for status in RunStatus::ALL {
            assert_eq!(
                classify_run(&run("RUN-1A09B4", status, 0.61), &policy),
                TriageDecision::FloorExcluded
            );
        }
    }

    #[test]
    fn test_classify_warn_is_borderline_even_above_auto_pass() {
        let policy = TriagePolicy::default();
        assert_eq!(
            classify_run(&run("RUN-X", RunStatus::Warn, 0.95), &policy),
            TriageDecision::Review(ReviewReason::Borderline {
                warn: true,
                below_auto_pass: false
            })
        );
    }

    #[test]
    fn test_classify_band_is_half_open() {
        let policy = TriagePolicy::default().with_sample_percent(0);
        assert!(classify_run(&run("a", RunStatus::Passed, 0.65), &policy).needs_review());
        assert_eq!(
            classify_run(&run("b", RunStatus::Passed, 0.85), &policy),
            TriageDecision::AutoPass
        );
    }

    #[test]
    fn test_classify_sampled() {
        // RUN-2D44A0 has bucket 18.
        let policy = TriagePolicy::default().with_sample_percent(19);
        assert_eq!(
            classify_run(&run("RUN-2D44A0", RunStatus::Passed, 0.89), &policy),
            TriageDecision::Review(ReviewReason::Sampled { bucket: 18 })
        );
        let policy = TriagePolicy::default().with_sample_percent(18);
        assert_eq!(
            classify_run(&run("RUN-2D44A0", RunStatus::Passed, 0.89), &policy),
            TriageDecision::AutoPass
        );
    }

    #[test]
    fn test_borderline_takes_precedence_over_sampling() {
        let policy = TriagePolicy::default().with_sample_percent(100);
        let decision = classify_run(&run("RUN-6F12A9", RunStatus::Warn, 0.78), &policy);
        assert!(matches!(
            decision,
            TriageDecision::Review(ReviewReason::Borderline { .. })
        ));
    }

    #[test]
    fn test_full_sampling_queues_everything_above_floor() {
        let policy = TriagePolicy::default().with_sample_percent(100);
        let runs = vec![
            run("a", RunStatus::Passed, 0.99),
            run("b", RunStatus::Failed, 0.10),
            run("c", RunStatus::Passed, 0.90),
        ];
        let queue = build_review_queue(&runs, &policy).unwrap();
        assert_eq!(queue.run_ids(), vec!["a", "c"]);
        assert_eq!(queue.sampled_count(), 2);
        assert_eq!(queue.floor_excluded, 1);
    }

    #[test]
    fn test_policy_checked_before_runs() {
        let policy = TriagePolicy::default().with_review_floor(0.9);
        let runs = vec![run("", RunStatus::Passed, 7.0)];
        let err = build_review_queue(&runs, &policy).unwrap_err();
        assert!(matches!(err, TriageError::Configuration(_)));
    }

    #[test]
    fn test_bad_record_fails_whole_batch() {
        let runs = vec![
            run("RUN-6F12A9", RunStatus::Warn, 0.78),
            run("RUN-BAD", RunStatus::Passed, 1.3),
        ];
        let err = select_for_review(&runs, &TriagePolicy::default()).unwrap_err();
        assert_eq!(
            err,
            TriageError::DataValidation(ValidationError::CiOutOfRange {
                run_id: "RUN-BAD".into(),
                ci_avg: 1.3
            })
        );
    }

    #[test]
    fn test_queue_counts() {
        let policy = TriagePolicy::default();
        let runs = vec![
            run("w", RunStatus::Warn, 0.9),
            run("m", RunStatus::Passed, 0.7),
            run("f", RunStatus::Failed, 0.2),
        ];
        let queue = build_review_queue(&runs, &policy).unwrap();
        assert_eq!(queue.evaluated, 3);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.borderline_count(), 2);
        assert!(queue.contains("m"));
        assert!(!queue.contains("f"));
    }
}
