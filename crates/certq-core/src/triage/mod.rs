//! Human-in-the-loop review-queue triage.
//!
//! Decides, per certification run, whether a human reviewer has to look at
//! it before it is certified:
//!
//! - **Floor exclusion**: runs whose confidence index is below the review
//!   floor are a clear fail and never enter the queue.
//! - **Borderline review**: `WARN` runs and runs below the auto-pass
//!   threshold always enter the queue.
//! - **Deterministic sampling**: a fixed share of otherwise auto-passing
//!   runs is pulled in for spot checks, keyed on a stable hash of the run id.

pub mod error;
pub mod policy;
pub mod sampling;
pub mod selector;

pub use error::{TriageError, TriageResult};
pub use policy::{CiBand, TriagePolicy};
pub use sampling::{deterministic_sample_percent, fnv1a_32};
pub use selector::{
    build_review_queue, classify_run, select_for_review, QueueEntry, ReviewQueue, ReviewReason,
    TriageDecision,
};
