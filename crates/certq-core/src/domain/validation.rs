//! Invariant checks for run snapshots.
//!
//! A batch is accepted only when every run passes; the first offending
//! record is reported and nothing is skipped.

use std::collections::HashSet;

use chrono::NaiveDateTime;

use super::error::ValidationError;
use super::run::Run;

/// `chrono` format of `Run::started_at`.
pub const STARTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Validate a single run.
///
/// # Errors
///
/// - `ValidationError::EmptyRunId`: `run_id` is blank.
/// - `ValidationError::EmptyDeviceId`: `device_id` is blank.
/// - `ValidationError::CiOutOfRange`: `ci_avg` is NaN or outside [0, 1].
/// - `ValidationError::BadStartedAt`: `started_at` is not `YYYY-MM-DD HH:MM`.
pub fn validate_run(run: &Run) -> Result<(), ValidationError> {
    if run.run_id.trim().is_empty() {
        return Err(ValidationError::EmptyRunId);
    }

    if run.device_id.trim().is_empty() {
        return Err(ValidationError::EmptyDeviceId {
            run_id: run.run_id.clone(),
        });
    }

    if !(0.0..=1.0).contains(&run.ci_avg) {
        return Err(ValidationError::CiOutOfRange {
            run_id: run.run_id.clone(),
            ci_avg: run.ci_avg,
        });
    }

    // chrono accepts single-digit fields, so pin the width as well.
    let well_formed = run.started_at.len() == 16
        && NaiveDateTime::parse_from_str(&run.started_at, STARTED_AT_FORMAT).is_ok();
    if !well_formed {
        return Err(ValidationError::BadStartedAt {
            run_id: run.run_id.clone(),
            started_at: run.started_at.clone(),
        });
    }

    Ok(())
}

/// Validate a batch of runs, including uniqueness of `run_id`.
pub fn validate_runs(runs: &[Run]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(runs.len());
    for run in runs {
        validate_run(run)?;
        if !seen.insert(run.run_id.as_str()) {
            return Err(ValidationError::DuplicateRunId {
                run_id: run.run_id.clone(),
            });
        }
    }
    Ok(())
}
