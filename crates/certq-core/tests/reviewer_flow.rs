//! End-to-end reviewer flow: dataset → queue → artifact → actions.

use chrono::Utc;
use serde_json::json;

use certq_core::{
    build_review_queue, dispatch, parse_dataset, read_queue_artifact, render_queue_md,
    write_queue_artifact, ActionError, CertqError, Dataset, QueueArtifact, RecordingSink,
    ReviewAction, ReviewActionSink, Run, RunStatus, TriagePolicy, ValidationError,
};

// ── Dataset ingestion ──

#[test]
fn dataset_file_feeds_the_selector() {
    let text = json!({
        "runs": [
            {"runId": "RUN-A", "deviceId": "Canon DR-C240", "status": "PASSED",
             "ciAvg": 0.70, "tests": 40, "startedAt": "2025-08-22 09:05"},
            {"runId": "RUN-B", "deviceId": "Ricoh SP-112", "status": "FAILED",
             "ciAvg": 0.30, "tests": 36, "startedAt": "2025-08-22 07:55"}
        ]
    })
    .to_string();
    let dataset = parse_dataset(&text).unwrap();
    let queue = build_review_queue(&dataset.runs, &TriagePolicy::default()).unwrap();
    assert_eq!(queue.run_ids(), vec!["RUN-A"]);
}

#[test]
fn malformed_json_is_a_serialization_error() {
    let err = parse_dataset("{\"runs\": [").unwrap_err();
    assert!(matches!(err, CertqError::Serialization(_)));
}

#[test]
fn bad_started_at_rejects_dataset() {
    let text = json!({
        "runs": [
            {"runId": "RUN-A", "deviceId": "Canon DR-C240", "status": "PASSED",
             "ciAvg": 0.70, "tests": 40, "startedAt": "22/08/2025"}
        ]
    })
    .to_string();
    let err = parse_dataset(&text).unwrap_err();
    assert!(matches!(
        err,
        CertqError::Validation(ValidationError::BadStartedAt { .. })
    ));
}

// ── Artifact ──

#[test]
fn queue_artifact_survives_disk_roundtrip() {
    let demo = Dataset::demo();
    let queue = build_review_queue(&demo.runs, &TriagePolicy::default()).unwrap();
    let artifact = QueueArtifact::finalize(&queue, Utc::now());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.json");
    write_queue_artifact(&artifact, &path).unwrap();
    let loaded = read_queue_artifact(&path).unwrap();

    assert!(loaded.check_integrity().is_ok());
    assert_eq!(loaded.entries.len(), 2);
    assert_eq!(loaded.policy, TriagePolicy::default());
}

/// Deterministic full-precision values in [0, 1).
fn unit_floats(n: usize) -> Vec<f64> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

#[test]
fn full_precision_ci_values_keep_the_digest_stable() {
    let mut cis = unit_floats(2_000);
    cis.push(0.9856906946328695);
    let runs: Vec<Run> = cis
        .iter()
        .enumerate()
        .map(|(i, &ci)| {
            Run::new(
                format!("RUN-{i:06X}"),
                "Canon DR-C240",
                RunStatus::Warn,
                ci,
                40,
                "2025-08-22 09:05",
            )
        })
        .collect();
    let policy = TriagePolicy::new(0.8500000000000001, 0.1234567890123456, 8).unwrap();
    let queue = build_review_queue(&runs, &policy).unwrap();
    assert!(queue.len() > 1_500);

    let artifact = QueueArtifact::finalize(&queue, Utc::now());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.json");
    write_queue_artifact(&artifact, &path).unwrap();
    let loaded = read_queue_artifact(&path).unwrap();

    assert_eq!(loaded.policy, policy);
    assert_eq!(loaded.entries, artifact.entries);
    assert!(loaded.check_integrity().is_ok());
}

#[test]
fn edited_artifact_policy_is_detected() {
    let demo = Dataset::demo();
    let queue = build_review_queue(&demo.runs, &TriagePolicy::default()).unwrap();
    let mut artifact = QueueArtifact::finalize(&queue, Utc::now());
    artifact.policy.sample_percent = 50;
    assert!(!artifact.verify_integrity());
}

#[test]
fn markdown_lists_every_queued_run() {
    let demo = Dataset::demo();
    let queue = build_review_queue(&demo.runs, &TriagePolicy::default()).unwrap();
    let md = render_queue_md(&queue);
    assert!(md.contains("2 in queue"));
    assert!(md.contains("RUN-6F12A9"));
    assert!(md.contains("RUN-9E88F0"));
    assert!(!md.contains("RUN-1A09B4"));
}

// ── Actions ──

#[test]
fn reviewer_works_through_the_queue() {
    let demo = Dataset::demo();
    let queue = build_review_queue(&demo.runs, &TriagePolicy::default()).unwrap();
    let mut sink = RecordingSink::new("alice").restricted_to(&queue);

    sink.approve("RUN-6F12A9").unwrap();
    dispatch(
        &mut sink,
        "RUN-9E88F0",
        &ReviewAction::Rerun {
            tests: vec!["A-08".into(), "E-62".into()],
        },
    )
    .unwrap();

    let err = sink.reject("RUN-7B54C3", Some("not queued")).unwrap_err();
    assert!(matches!(err, ActionError::NotQueued { .. }));

    let names: Vec<_> = sink.receipts().iter().map(|r| r.action.name()).collect();
    assert_eq!(names, vec!["approve", "rerun"]);
}
