//! Domain models for certq.
//!
//! Canonical definitions for the certification run snapshot:
//! - `Run`: a finished certification run as delivered by the run source
//! - `RunRecord`: untyped ingestion form of a run
//! - `RunStatus`: outcome classification of a run

pub mod error;
pub mod run;
pub mod validation;

pub use error::{CertqError, Result, ValidationError};
pub use run::{Run, RunRecord, RunStatus};
pub use validation::{validate_run, validate_runs, STARTED_AT_FORMAT};
