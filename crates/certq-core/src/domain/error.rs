//! Domain-level error taxonomy for certq.

/// Errors produced when a run or fixture record breaks a data invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("run id must not be empty")]
    EmptyRunId,

    #[error("run {run_id} has an empty device id")]
    EmptyDeviceId { run_id: String },

    #[error("run {run_id} has ciAvg {ci_avg} outside [0, 1]")]
    CiOutOfRange { run_id: String, ci_avg: f64 },

    #[error("run {run_id} has unrecognized status: {status}")]
    UnknownStatus { run_id: String, status: String },

    #[error("duplicate run id: {run_id}")]
    DuplicateRunId { run_id: String },

    #[error("run {run_id} has malformed startedAt {started_at:?} (expected YYYY-MM-DD HH:MM)")]
    BadStartedAt { run_id: String, started_at: String },

    #[error("catalog test {test_id} has ci {ci} outside [0, 1]")]
    CatalogCiOutOfRange { test_id: String, ci: f64 },

    #[error("catalog test {test_id} has a non-positive duration")]
    InvalidDuration { test_id: String },

    #[error("duplicate catalog test id: {test_id}")]
    DuplicateTestId { test_id: String },

    #[error("duplicate device id: {device_id}")]
    DuplicateDeviceId { device_id: String },
}

/// certq domain errors.
#[derive(Debug, thiserror::Error)]
pub enum CertqError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("triage error: {0}")]
    Triage(#[from] crate::triage::TriageError),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for certq domain operations.
pub type Result<T> = std::result::Result<T, CertqError>;
