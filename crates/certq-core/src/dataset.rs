//! Reviewer-console dataset: runs, devices, the test catalog and an
//! analytics snapshot.
//!
//! A `Dataset` is a plain value owned by whoever assembled it. There is no
//! process-wide fixture state; [`Dataset::demo`] builds a fresh copy of the
//! demo data on every call.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::error::ValidationError;
use crate::domain::run::{Run, RunRecord, RunStatus};
use crate::domain::validation::validate_runs;
use crate::domain::Result;
use crate::obs;

/// Operational state of a lab device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    Online,
    Offline,
    Maint,
    Passed,
    Warn,
    Failed,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
            Self::Maint => "MAINT",
            Self::Passed => "PASSED",
            Self::Warn => "WARN",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A scanner registered with a lab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub model: String,
    pub firmware: String,
    pub status: DeviceStatus,
    pub lab: String,
    pub last_seen: String,
}

/// An entry in the certification test catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogTest {
    pub id: String,
    pub name: String,
    pub status: RunStatus,
    pub ci: f64,
    /// Duration in seconds.
    pub duration: u32,
}

/// A group of catalog tests (basic, advanced, workflows).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestGroup {
    pub id: String,
    pub title: String,
    pub count: u32,
}

/// Run counts per status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub struct StatusCounts {
    pub passed: u32,
    pub warn: u32,
    pub failed: u32,
}

impl StatusCounts {
    pub fn total(&self) -> u32 {
        self.passed + self.warn + self.failed
    }

    pub fn get(&self, status: RunStatus) -> u32 {
        match status {
            RunStatus::Passed => self.passed,
            RunStatus::Warn => self.warn,
            RunStatus::Failed => self.failed,
        }
    }

    /// Tally statuses of `runs`.
    pub fn from_runs(runs: &[Run]) -> Self {
        let mut counts = Self::default();
        for run in runs {
            match run.status {
                RunStatus::Passed => counts.passed += 1,
                RunStatus::Warn => counts.warn += 1,
                RunStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

/// A frequently failing catalog test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlakyTest {
    pub id: String,
    pub name: String,
    pub flakiness: String,
    pub fails_7d: u32,
}

/// Seven-day analytics snapshot shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub runs_7d: u32,
    pub runs_trend: String,
    /// Daily pass rate, oldest first.
    pub pass_rate: Vec<f64>,
    /// Daily average CI, oldest first.
    pub avg_ci: Vec<f64>,
    pub by_status: StatusCounts,
    pub top_flaky: Vec<FlakyTest>,
    /// Share of runs that went through human review, in percent.
    pub hitl_rate: u32,
}

impl AnalyticsSnapshot {
    /// Rounded percentage of `status` in `by_status`; 0 for an empty tally.
    pub fn status_share(&self, status: RunStatus) -> u32 {
        let total = self.by_status.total();
        if total == 0 {
            return 0;
        }
        ((f64::from(self.by_status.get(status)) / f64::from(total)) * 100.0).round() as u32
    }
}

/// Runs table filter: status plus free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFilter {
    /// `None` matches every status.
    pub status: Option<RunStatus>,
    /// Case-insensitive substring of device id or run id; blank matches all.
    pub search: String,
}

impl RunFilter {
    pub fn matches(&self, run: &Run) -> bool {
        if self.status.is_some_and(|s| s != run.status) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || run.device_id.to_lowercase().contains(&needle)
            || run.run_id.to_lowercase().contains(&needle)
    }

    /// Matching runs in input order.
    pub fn apply<'a>(&self, runs: &'a [Run]) -> Vec<&'a Run> {
        runs.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Everything the reviewer console renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub runs: Vec<Run>,
    pub devices: Vec<Device>,
    pub tests: Vec<CatalogTest>,
    pub test_groups: Vec<TestGroup>,
    pub analytics: AnalyticsSnapshot,
}

/// On-disk form of a dataset; runs are checked on conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetFile {
    pub runs: Vec<RunRecord>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub tests: Vec<CatalogTest>,
    #[serde(default)]
    pub test_groups: Vec<TestGroup>,
    pub analytics: Option<AnalyticsSnapshot>,
}

impl TryFrom<DatasetFile> for Dataset {
    type Error = ValidationError;

    fn try_from(file: DatasetFile) -> std::result::Result<Self, Self::Error> {
        let runs = file
            .runs
            .into_iter()
            .map(Run::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let analytics = file.analytics.unwrap_or_else(|| AnalyticsSnapshot {
            runs_7d: runs.len() as u32,
            runs_trend: String::new(),
            pass_rate: Vec::new(),
            avg_ci: Vec::new(),
            by_status: StatusCounts::from_runs(&runs),
            top_flaky: Vec::new(),
            hitl_rate: 0,
        });
        let dataset = Self {
            runs,
            devices: file.devices,
            tests: file.tests,
            test_groups: file.test_groups,
            analytics,
        };
        dataset.validate()?;
        Ok(dataset)
    }
}

impl Dataset {
    /// Check run invariants, catalog ranges and id uniqueness.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_runs(&self.runs)?;

        let mut test_ids = HashSet::new();
        for test in &self.tests {
            if !(0.0..=1.0).contains(&test.ci) {
                return Err(ValidationError::CatalogCiOutOfRange {
                    test_id: test.id.clone(),
                    ci: test.ci,
                });
            }
            if test.duration == 0 {
                return Err(ValidationError::InvalidDuration {
                    test_id: test.id.clone(),
                });
            }
            if !test_ids.insert(test.id.as_str()) {
                return Err(ValidationError::DuplicateTestId {
                    test_id: test.id.clone(),
                });
            }
        }

        let mut device_ids = HashSet::new();
        for device in &self.devices {
            if !device_ids.insert(device.id.as_str()) {
                return Err(ValidationError::DuplicateDeviceId {
                    device_id: device.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Look up a run by id.
    pub fn run(&self, run_id: &str) -> Option<&Run> {
        self.runs.iter().find(|r| r.run_id == run_id)
    }

    /// The reviewer console's demo data.
    pub fn demo() -> Self {
        let runs = vec![
            Run::new("RUN-6F12A9", "Panasonic KV-S1057C", RunStatus::Warn, 0.78, 38, "2025-08-22 10:13"),
            Run::new("RUN-7B54C3", "Fujitsu fi-7160", RunStatus::Passed, 0.91, 42, "2025-08-22 09:42"),
            Run::new("RUN-3C21D8", "Canon DR-C240", RunStatus::Passed, 0.87, 40, "2025-08-22 09:05"),
            Run::new("RUN-1A09B4", "Brother ADS-2700W", RunStatus::Failed, 0.61, 41, "2025-08-22 08:58"),
            Run::new("RUN-9E88F0", "Epson DS-575W", RunStatus::Warn, 0.82, 39, "2025-08-22 08:21"),
            Run::new("RUN-2D44A0", "Ricoh SP-112", RunStatus::Passed, 0.89, 36, "2025-08-22 07:55"),
        ];

        let device = |id: &str, model: &str, firmware: &str, status, lab: &str, last_seen: &str| {
            Device {
                id: id.into(),
                model: model.into(),
                firmware: firmware.into(),
                status,
                lab: lab.into(),
                last_seen: last_seen.into(),
            }
        };
        let devices = vec![
            device("D-100", "Panasonic KV-S1057C", "1.4.2", DeviceStatus::Online, "Pensacola Lab A", "2 min ago"),
            device("D-101", "Fujitsu fi-7160", "3.1.0", DeviceStatus::Offline, "Tokyo Lab", "1 hr ago"),
            device("D-102", "Canon DR-C240", "2.7.5", DeviceStatus::Online, "Zurich Lab", "just now"),
            device("D-103", "Brother ADS-2700W", "1.9.8", DeviceStatus::Maint, "Pensacola Lab B", "yesterday"),
            device("D-104", "Epson DS-575W", "4.2.0", DeviceStatus::Online, "Remote Rig 3", "5 min ago"),
            device("D-105", "Ricoh SP-112", "0.9.4", DeviceStatus::Online, "Pensacola Lab A", "11 min ago"),
        ];

        let test = |id: &str, name: &str, status, ci, duration| CatalogTest {
            id: id.into(),
            name: name.into(),
            status,
            ci,
            duration,
        };
        let tests = vec![
            test("A-01", "Scan single page", RunStatus::Passed, 0.94, 4),
            test("A-08", "Duplex scanning", RunStatus::Warn, 0.71, 7),
            test("B-17", "OCR accuracy", RunStatus::Passed, 0.89, 5),
            test("C-33", "Scan to FTP/SFTP", RunStatus::Passed, 0.90, 6),
            test("D-48", "Secure transmission (TLS)", RunStatus::Passed, 0.95, 3),
            test("E-62", "Scan speed (PPM)", RunStatus::Warn, 0.80, 10),
        ];

        let test_groups = vec![
            TestGroup { id: "basic".into(), title: "Basic (A)".into(), count: 15 },
            TestGroup { id: "advanced".into(), title: "Advanced (B)".into(), count: 15 },
            TestGroup { id: "workflows".into(), title: "Workflow (C)".into(), count: 15 },
        ];

        let flaky = |id: &str, name: &str, flakiness: &str, fails_7d| FlakyTest {
            id: id.into(),
            name: name.into(),
            flakiness: flakiness.into(),
            fails_7d,
        };
        let analytics = AnalyticsSnapshot {
            runs_7d: 248,
            runs_trend: "+6% wow".into(),
            pass_rate: vec![0.88, 0.90, 0.92, 0.91, 0.93, 0.94, 0.93],
            avg_ci: vec![0.85, 0.86, 0.87, 0.88, 0.89, 0.90, 0.88],
            by_status: StatusCounts {
                passed: 72,
                warn: 18,
                failed: 10,
            },
            top_flaky: vec![
                flaky("A-08", "Duplex scanning", "22%", 5),
                flaky("B-20", "Deskew stability", "18%", 4),
                flaky("C-11", "PDF/A tag compliance", "12%", 3),
            ],
            hitl_rate: 28,
        };

        Self {
            runs,
            devices,
            tests,
            test_groups,
            analytics,
        }
    }
}

/// Parse a dataset from JSON text.
pub fn parse_dataset(json: &str) -> Result<Dataset> {
    let file: DatasetFile = serde_json::from_str(json)?;
    Ok(Dataset::try_from(file)?)
}

/// Load a dataset JSON file.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let data = std::fs::read_to_string(path)?;
    let dataset = parse_dataset(&data)?;
    obs::emit_dataset_loaded(
        &path.display().to_string(),
        dataset.runs.len(),
        dataset.devices.len(),
        dataset.tests.len(),
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CertqError;
    use serde_json::json;

    #[test]
    fn test_demo_is_valid() {
        let demo = Dataset::demo();
        assert!(demo.validate().is_ok());
        assert_eq!(demo.runs.len(), 6);
        assert_eq!(demo.tests.len(), 6);
        assert_eq!(demo.tests.last().map(|t| t.id.as_str()), Some("E-62"));
        assert_eq!(demo.analytics.by_status.total(), 100);
    }

    #[test]
    fn test_device_status_display_matches_wire_form() {
        for status in [DeviceStatus::Online, DeviceStatus::Maint, DeviceStatus::Warn] {
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                json!(status.as_str())
            );
        }
        assert_eq!(format!("{:<8}|", DeviceStatus::Offline), "OFFLINE |");
    }

    #[test]
    fn test_status_share() {
        let analytics = Dataset::demo().analytics;
        assert_eq!(analytics.status_share(RunStatus::Passed), 72);
        assert_eq!(analytics.status_share(RunStatus::Failed), 10);

        let empty = AnalyticsSnapshot {
            by_status: StatusCounts::default(),
            ..analytics
        };
        assert_eq!(empty.status_share(RunStatus::Warn), 0);
    }

    #[test]
    fn test_filter_by_status_and_search() {
        let demo = Dataset::demo();

        let warn = RunFilter {
            status: Some(RunStatus::Warn),
            search: String::new(),
        };
        let ids: Vec<_> = warn.apply(&demo.runs).iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, vec!["RUN-6F12A9", "RUN-9E88F0"]);

        let search = RunFilter {
            status: None,
            search: "  canon ".into(),
        };
        assert_eq!(search.apply(&demo.runs).len(), 1);

        let by_id = RunFilter {
            status: None,
            search: "run-7b".into(),
        };
        assert_eq!(by_id.apply(&demo.runs)[0].device_id, "Fujitsu fi-7160");

        assert_eq!(RunFilter::default().apply(&demo.runs).len(), 6);
    }

    #[test]
    fn test_parse_dataset_without_optional_sections() {
        let text = json!({
            "runs": [
                {"runId": "RUN-1", "deviceId": "Canon DR-C240", "status": "PASSED",
                 "ciAvg": 0.9, "tests": 40, "startedAt": "2025-08-22 09:05"},
                {"runId": "RUN-2", "deviceId": "Ricoh SP-112", "status": "WARN",
                 "ciAvg": 0.7, "tests": 36, "startedAt": "2025-08-22 07:55"}
            ]
        })
        .to_string();
        let dataset = parse_dataset(&text).unwrap();
        assert_eq!(dataset.runs.len(), 2);
        assert_eq!(dataset.analytics.by_status.warn, 1);
        assert!(dataset.devices.is_empty());
    }

    #[test]
    fn test_parse_dataset_rejects_unknown_status() {
        let text = json!({
            "runs": [
                {"runId": "RUN-1", "deviceId": "Canon DR-C240", "status": "SKIPPED",
                 "ciAvg": 0.9, "tests": 40, "startedAt": "2025-08-22 09:05"}
            ]
        })
        .to_string();
        let err = parse_dataset(&text).unwrap_err();
        assert!(matches!(
            err,
            CertqError::Validation(ValidationError::UnknownStatus { .. })
        ));
    }

    #[test]
    fn test_catalog_checks() {
        let mut demo = Dataset::demo();
        demo.tests[1].duration = 0;
        assert!(matches!(
            demo.validate(),
            Err(ValidationError::InvalidDuration { .. })
        ));

        let mut demo = Dataset::demo();
        demo.tests[2].id = "A-01".into();
        assert!(matches!(
            demo.validate(),
            Err(ValidationError::DuplicateTestId { .. })
        ));

        let mut demo = Dataset::demo();
        demo.devices[5].id = "D-100".into();
        assert!(matches!(
            demo.validate(),
            Err(ValidationError::DuplicateDeviceId { .. })
        ));
    }

    #[test]
    fn test_load_dataset_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        std::fs::write(&path, serde_json::to_string(&Dataset::demo()).unwrap()).unwrap();
        let loaded = load_dataset(&path).unwrap();
        assert_eq!(loaded, Dataset::demo());
    }
}
