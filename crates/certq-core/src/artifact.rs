//! Digest-sealed snapshot of a computed review queue.
//!
//! Written next to the reviewer console's data so an auditor can check
//! later which runs were put in front of reviewers under which policy.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{CertqError, Result};
use crate::triage::{QueueEntry, ReviewQueue, ReviewReason, TriagePolicy};

/// Current artifact schema version.
pub const QUEUE_ARTIFACT_SCHEMA: &str = "1.0";

/// Persisted review-queue artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub policy: TriagePolicy,
    pub entries: Vec<QueueEntry>,
    pub evaluated: usize,
    pub floor_excluded: usize,
    /// SHA-256 hex digest over everything above.
    pub content_digest: String,
}

impl QueueArtifact {
    /// Seal a queue into an artifact.
    pub fn finalize(queue: &ReviewQueue, now: DateTime<Utc>) -> Self {
        let mut artifact = Self {
            schema_version: QUEUE_ARTIFACT_SCHEMA.to_string(),
            generated_at: now,
            policy: queue.policy,
            entries: queue.entries.clone(),
            evaluated: queue.evaluated,
            floor_excluded: queue.floor_excluded,
            content_digest: String::new(),
        };
        artifact.content_digest = artifact.compute_digest();
        artifact
    }

    fn compute_digest(&self) -> String {
        let payload = serde_json::json!({
            "schema_version": self.schema_version,
            "generated_at": self.generated_at.to_rfc3339(),
            "policy": self.policy,
            "entries": self.entries,
            "evaluated": self.evaluated,
            "floor_excluded": self.floor_excluded,
        });
        // serde_json::Value maps are ordered, so the bytes are canonical.
        let bytes = serde_json::to_vec(&payload).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    /// Whether the stored digest still matches the content.
    pub fn verify_integrity(&self) -> bool {
        self.content_digest == self.compute_digest()
    }

    /// Like [`verify_integrity`](Self::verify_integrity) but reports both digests.
    pub fn check_integrity(&self) -> Result<()> {
        let actual = self.compute_digest();
        if self.content_digest != actual {
            return Err(CertqError::DigestMismatch {
                expected: self.content_digest.clone(),
                actual,
            });
        }
        Ok(())
    }
}

/// Write a queue artifact to disk as pretty JSON.
pub fn write_queue_artifact(artifact: &QueueArtifact, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(artifact)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a queue artifact from disk. Does not verify the digest.
pub fn read_queue_artifact(path: &Path) -> Result<QueueArtifact> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn reason_md(reason: &ReviewReason) -> String {
    match reason {
        ReviewReason::Borderline {
            warn,
            below_auto_pass,
        } => match (warn, below_auto_pass) {
            (true, true) => "borderline (WARN, below auto-pass)".to_string(),
            (true, false) => "borderline (WARN)".to_string(),
            _ => "borderline (below auto-pass)".to_string(),
        },
        ReviewReason::Sampled { bucket } => format!("sampled (bucket {bucket})"),
    }
}

/// Render a markdown summary of a queue.
pub fn render_queue_md(queue: &ReviewQueue) -> String {
    let mut out = String::new();
    out.push_str("# Pending Human Reviews\n\n");
    out.push_str(&format!(
        "{} in queue · Policy: {}\n\n",
        queue.len(),
        queue.policy.describe()
    ));
    out.push_str(&format!(
        "- evaluated: {}\n- borderline: {}\n- sampled: {}\n- below floor: {}\n",
        queue.evaluated,
        queue.borderline_count(),
        queue.sampled_count(),
        queue.floor_excluded
    ));

    if !queue.is_empty() {
        out.push_str("\n## Queue\n");
        for entry in &queue.entries {
            out.push_str(&format!(
                "- `{}` {} — CI {:.2}, {}\n",
                entry.run.run_id,
                entry.run.device_id,
                entry.run.ci_avg,
                reason_md(&entry.reason)
            ));
        }
    }
    out
}
