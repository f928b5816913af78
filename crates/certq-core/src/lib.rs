//! certq Core Library
//!
//! Review-queue triage for scanner-certification runs: which finished runs
//! a human reviewer has to look at, and why.

pub mod actions;
pub mod artifact;
pub mod dataset;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod telemetry;
pub mod triage;

pub use actions::{
    dispatch, ActionError, ActionReceipt, ActionResult, RecordingSink, ReviewAction,
    ReviewActionSink, TracingSink,
};
pub use artifact::{
    read_queue_artifact, render_queue_md, write_queue_artifact, QueueArtifact,
    QUEUE_ARTIFACT_SCHEMA,
};
pub use dataset::{
    load_dataset, parse_dataset, AnalyticsSnapshot, CatalogTest, Dataset, Device, DeviceStatus,
    FlakyTest, RunFilter, StatusCounts, TestGroup,
};
pub use domain::{
    validate_run, validate_runs, CertqError, Result, Run, RunRecord, RunStatus, ValidationError,
};
pub use triage::{
    build_review_queue, classify_run, deterministic_sample_percent, fnv1a_32, select_for_review,
    CiBand, QueueEntry, ReviewQueue, ReviewReason, TriageDecision, TriageError, TriagePolicy,
    TriageResult,
};

pub use metrics::{MetricsSnapshot, METRICS};
pub use obs::{emit_dataset_loaded, emit_queue_built, emit_review_action, QueueSpan};
pub use telemetry::init_tracing;

/// certq version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
