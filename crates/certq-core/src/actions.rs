//! Reviewer actions on queued runs (approve / reject / re-run a test subset).
//!
//! The selector never calls these. A presentation layer collects the
//! reviewer's choice and hands it to a [`ReviewActionSink`]; wiring a sink
//! to an audit or orchestration backend lives outside this crate.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::obs;
use crate::triage::ReviewQueue;

/// Errors produced when a reviewer action is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("run id must not be empty")]
    EmptyRunId,

    #[error("re-run of {run_id} needs at least one test id")]
    EmptyRerunSubset { run_id: String },

    #[error("run {run_id} is not in the review queue")]
    NotQueued { run_id: String },
}

/// Result type for reviewer actions.
pub type ActionResult<T> = std::result::Result<T, ActionError>;

/// A reviewer decision on a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject { reason: Option<String> },
    /// Re-run the listed catalog tests (e.g. `A-08`).
    Rerun { tests: Vec<String> },
}

impl ReviewAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject { .. } => "reject",
            Self::Rerun { .. } => "rerun",
        }
    }
}

/// Acknowledgement returned by a sink for an accepted action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub action_id: String,
    pub run_id: String,
    pub action: ReviewAction,
    pub reviewer: String,
    pub recorded_at: DateTime<Utc>,
}

impl ActionReceipt {
    fn new(run_id: &str, action: ReviewAction, reviewer: &str, now: DateTime<Utc>) -> Self {
        Self {
            action_id: Uuid::new_v4().to_string(),
            run_id: run_id.to_string(),
            action,
            reviewer: reviewer.to_string(),
            recorded_at: now,
        }
    }
}

/// Capability interface for reviewer actions.
pub trait ReviewActionSink {
    /// Certify the run as reviewed and passing.
    fn approve(&mut self, run_id: &str) -> ActionResult<ActionReceipt>;

    /// Reject the run, optionally with a reason.
    fn reject(&mut self, run_id: &str, reason: Option<&str>) -> ActionResult<ActionReceipt>;

    /// Request a re-run of a subset of the run's tests.
    fn rerun(&mut self, run_id: &str, test_subset: &[String]) -> ActionResult<ActionReceipt>;
}

/// Route `action` to the matching sink method.
pub fn dispatch(
    sink: &mut dyn ReviewActionSink,
    run_id: &str,
    action: &ReviewAction,
) -> ActionResult<ActionReceipt> {
    match action {
        ReviewAction::Approve => sink.approve(run_id),
        ReviewAction::Reject { reason } => sink.reject(run_id, reason.as_deref()),
        ReviewAction::Rerun { tests } => sink.rerun(run_id, tests),
    }
}

fn check_action(
    run_id: &str,
    action: &ReviewAction,
    allowed: Option<&HashSet<String>>,
) -> ActionResult<()> {
    if run_id.trim().is_empty() {
        return Err(ActionError::EmptyRunId);
    }
    if let Some(allowed) = allowed {
        if !allowed.contains(run_id) {
            return Err(ActionError::NotQueued {
                run_id: run_id.to_string(),
            });
        }
    }
    if let ReviewAction::Rerun { tests } = action {
        if tests.iter().all(|t| t.trim().is_empty()) {
            return Err(ActionError::EmptyRerunSubset {
                run_id: run_id.to_string(),
            });
        }
    }
    Ok(())
}

fn rerun_action(test_subset: &[String]) -> ReviewAction {
    ReviewAction::Rerun {
        tests: test_subset
            .iter()
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect(),
    }
}

/// In-memory sink that keeps receipts in the order actions were accepted.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    reviewer: String,
    allowed: Option<HashSet<String>>,
    receipts: Vec<ActionReceipt>,
}

impl RecordingSink {
    pub fn new(reviewer: impl Into<String>) -> Self {
        Self {
            reviewer: reviewer.into(),
            allowed: None,
            receipts: Vec::new(),
        }
    }

    /// Only accept actions on runs that are in `queue`.
    pub fn restricted_to(mut self, queue: &ReviewQueue) -> Self {
        self.allowed = Some(queue.run_ids().into_iter().map(String::from).collect());
        self
    }

    pub fn receipts(&self) -> &[ActionReceipt] {
        &self.receipts
    }

    fn record(&mut self, run_id: &str, action: ReviewAction) -> ActionResult<ActionReceipt> {
        check_action(run_id, &action, self.allowed.as_ref())?;
        let receipt = ActionReceipt::new(run_id, action, &self.reviewer, Utc::now());
        self.receipts.push(receipt.clone());
        Ok(receipt)
    }
}

impl ReviewActionSink for RecordingSink {
    fn approve(&mut self, run_id: &str) -> ActionResult<ActionReceipt> {
        self.record(run_id, ReviewAction::Approve)
    }

    fn reject(&mut self, run_id: &str, reason: Option<&str>) -> ActionResult<ActionReceipt> {
        self.record(
            run_id,
            ReviewAction::Reject {
                reason: reason.map(String::from),
            },
        )
    }

    fn rerun(&mut self, run_id: &str, test_subset: &[String]) -> ActionResult<ActionReceipt> {
        self.record(run_id, rerun_action(test_subset))
    }
}

/// Sink that only emits a `review.action` tracing event per accepted action.
///
/// Stand-in for a real audit/orchestration integration.
#[derive(Debug, Clone)]
pub struct TracingSink {
    reviewer: String,
    allowed: Option<HashSet<String>>,
}

impl TracingSink {
    pub fn new(reviewer: impl Into<String>) -> Self {
        Self {
            reviewer: reviewer.into(),
            allowed: None,
        }
    }

    /// Only accept actions on runs that are in `queue`.
    pub fn restricted_to(mut self, queue: &ReviewQueue) -> Self {
        self.allowed = Some(queue.run_ids().into_iter().map(String::from).collect());
        self
    }

    fn emit(&self, run_id: &str, action: ReviewAction) -> ActionResult<ActionReceipt> {
        check_action(run_id, &action, self.allowed.as_ref())?;
        obs::emit_review_action(run_id, action.name(), &self.reviewer);
        Ok(ActionReceipt::new(run_id, action, &self.reviewer, Utc::now()))
    }
}

impl ReviewActionSink for TracingSink {
    fn approve(&mut self, run_id: &str) -> ActionResult<ActionReceipt> {
        self.emit(run_id, ReviewAction::Approve)
    }

    fn reject(&mut self, run_id: &str, reason: Option<&str>) -> ActionResult<ActionReceipt> {
        self.emit(
            run_id,
            ReviewAction::Reject {
                reason: reason.map(String::from),
            },
        )
    }

    fn rerun(&mut self, run_id: &str, test_subset: &[String]) -> ActionResult<ActionReceipt> {
        self.emit(run_id, rerun_action(test_subset))
    }
}
