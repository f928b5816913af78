//! Certification run snapshots.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Outcome classification of a run, produced by the external test executor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Passed,
    Warn,
    Failed,
}

impl RunStatus {
    /// All statuses in display order.
    pub const ALL: [RunStatus; 3] = [Self::Passed, Self::Warn, Self::Failed];

    /// Wire representation (`PASSED`, `WARN`, `FAILED`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Warn => "WARN",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PASSED" => Ok(Self::Passed),
            "WARN" => Ok(Self::Warn),
            "FAILED" => Ok(Self::Failed),
            other => Err(other.to_string()),
        }
    }
}

/// A finished certification run.
///
/// Runs arrive as an immutable snapshot; nothing in this crate mutates them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    /// Opaque identifier, unique within a collection.
    pub run_id: String,

    /// Display label of the scanner under test.
    pub device_id: String,

    /// Outcome classification.
    pub status: RunStatus,

    /// Average confidence index across the run's tests, in [0, 1].
    pub ci_avg: f64,

    /// Number of tests executed.
    pub tests: u32,

    /// Start timestamp, `YYYY-MM-DD HH:MM`.
    pub started_at: String,
}

impl Run {
    /// Create a run.
    pub fn new(
        run_id: impl Into<String>,
        device_id: impl Into<String>,
        status: RunStatus,
        ci_avg: f64,
        tests: u32,
        started_at: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            device_id: device_id.into(),
            status,
            ci_avg,
            tests,
            started_at: started_at.into(),
        }
    }
}

/// Ingestion form of a run whose status has not been checked yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_id: String,
    pub device_id: String,
    pub status: String,
    pub ci_avg: f64,
    #[serde(default)]
    pub tests: u32,
    pub started_at: String,
}

impl TryFrom<RunRecord> for Run {
    type Error = ValidationError;

    fn try_from(record: RunRecord) -> Result<Self, Self::Error> {
        let status = record
            .status
            .parse::<RunStatus>()
            .map_err(|status| ValidationError::UnknownStatus {
                run_id: record.run_id.clone(),
                status,
            })?;
        Ok(Self {
            run_id: record.run_id,
            device_id: record.device_id,
            status,
            ci_avg: record.ci_avg,
            tests: record.tests,
            started_at: record.started_at,
        })
    }
}

impl From<&Run> for RunRecord {
    fn from(run: &Run) -> Self {
        Self {
            run_id: run.run_id.clone(),
            device_id: run.device_id.clone(),
            status: run.status.as_str().to_string(),
            ci_avg: run.ci_avg,
            tests: run.tests,
            started_at: run.started_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(RunStatus::Warn).unwrap(), json!("WARN"));
        assert_eq!("FAILED".parse::<RunStatus>(), Ok(RunStatus::Failed));
        assert_eq!("warn".parse::<RunStatus>(), Err("warn".to_string()));
    }

    #[test]
    fn test_run_uses_camel_case_keys() {
        let run = Run::new(
            "RUN-6F12A9",
            "Panasonic KV-S1057C",
            RunStatus::Warn,
            0.78,
            38,
            "2025-08-22 10:13",
        );
        let v = serde_json::to_value(&run).unwrap();
        let obj = v.as_object().unwrap();
        for key in ["runId", "deviceId", "status", "ciAvg", "tests", "startedAt"] {
            assert!(obj.contains_key(key), "missing key: {key}");
        }
    }

    #[test]
    fn test_record_with_unknown_status_is_rejected() {
        let record: RunRecord = serde_json::from_value(json!({
            "runId": "RUN-X",
            "deviceId": "Canon DR-C240",
            "status": "SKIPPED",
            "ciAvg": 0.9,
            "tests": 12,
            "startedAt": "2025-08-22 09:05"
        }))
        .unwrap();
        let err = Run::try_from(record).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownStatus {
                run_id: "RUN-X".into(),
                status: "SKIPPED".into()
            }
        );
    }

    #[test]
    fn test_record_converts_to_run() {
        let run = Run::new("RUN-1", "Epson DS-575W", RunStatus::Passed, 0.9, 3, "2025-08-22 08:21");
        let record = RunRecord::from(&run);
        assert_eq!(record.status, "PASSED");
        assert_eq!(Run::try_from(record).unwrap(), run);
    }
}
