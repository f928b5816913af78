//! Triage policy thresholds.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{TriageError, TriageResult};

/// Where a CI value sits relative to a policy's thresholds.
///
/// Status-blind: a `WARN` run in the `AutoPass` band is still queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiBand {
    AutoPass,
    Review,
    BelowFloor,
}

impl CiBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoPass => "auto-pass",
            Self::Review => "review",
            Self::BelowFloor => "below floor",
        }
    }
}

impl fmt::Display for CiBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Numeric thresholds governing auto-pass, review and sampling.
///
/// A run with `ci_avg` below `review_floor` is a clear fail; at or above
/// `auto_pass_threshold` it passes unless it is a `WARN` run or sampled.
/// Everything in between goes to a reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriagePolicy {
    /// CI at or above which a run is auto-passed absent sampling.
    pub auto_pass_threshold: f64,
    /// CI below which a run is excluded from review entirely.
    pub review_floor: f64,
    /// Share of otherwise auto-passing runs pulled into review, in percent.
    pub sample_percent: u8,
}

impl Default for TriagePolicy {
    fn default() -> Self {
        Self {
            auto_pass_threshold: 0.85,
            review_floor: 0.65,
            sample_percent: 8,
        }
    }
}

impl TriagePolicy {
    /// Build a policy and validate it.
    pub fn new(
        auto_pass_threshold: f64,
        review_floor: f64,
        sample_percent: u8,
    ) -> TriageResult<Self> {
        let policy = Self {
            auto_pass_threshold,
            review_floor,
            sample_percent,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check `0 <= review_floor <= auto_pass_threshold <= 1` and
    /// `sample_percent <= 100`. Values are never clamped.
    pub fn validate(&self) -> TriageResult<()> {
        if !self.review_floor.is_finite() || !self.auto_pass_threshold.is_finite() {
            return Err(TriageError::Configuration(
                "thresholds must be finite numbers".into(),
            ));
        }
        if self.review_floor < 0.0 {
            return Err(TriageError::Configuration(format!(
                "review_floor {} is below 0",
                self.review_floor
            )));
        }
        if self.review_floor > self.auto_pass_threshold {
            return Err(TriageError::Configuration(format!(
                "review_floor {} exceeds auto_pass_threshold {}",
                self.review_floor, self.auto_pass_threshold
            )));
        }
        if self.auto_pass_threshold > 1.0 {
            return Err(TriageError::Configuration(format!(
                "auto_pass_threshold {} exceeds 1",
                self.auto_pass_threshold
            )));
        }
        if self.sample_percent > 100 {
            return Err(TriageError::Configuration(format!(
                "sample_percent {} exceeds 100",
                self.sample_percent
            )));
        }
        Ok(())
    }

    /// Override the auto-pass threshold (builder pattern).
    pub fn with_auto_pass_threshold(mut self, threshold: f64) -> Self {
        self.auto_pass_threshold = threshold;
        self
    }

    /// Override the review floor (builder pattern).
    pub fn with_review_floor(mut self, floor: f64) -> Self {
        self.review_floor = floor;
        self
    }

    /// Override the sampling share (builder pattern).
    pub fn with_sample_percent(mut self, percent: u8) -> Self {
        self.sample_percent = percent;
        self
    }

    /// Band of `ci` under this policy.
    pub fn ci_band(&self, ci: f64) -> CiBand {
        if ci >= self.auto_pass_threshold {
            CiBand::AutoPass
        } else if ci >= self.review_floor {
            CiBand::Review
        } else {
            CiBand::BelowFloor
        }
    }

    /// One-line description, e.g. `CI in [0.65, 0.85) + 8% sampling`.
    pub fn describe(&self) -> String {
        format!(
            "CI in [{:.2}, {:.2}) + {}% sampling",
            self.review_floor, self.auto_pass_threshold, self.sample_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ci_band_edges() {
        let policy = TriagePolicy::default();
        assert_eq!(policy.ci_band(0.85), CiBand::AutoPass);
        assert_eq!(policy.ci_band(0.8499), CiBand::Review);
        assert_eq!(policy.ci_band(0.65), CiBand::Review);
        assert_eq!(policy.ci_band(0.6499), CiBand::BelowFloor);
        assert_eq!(policy.ci_band(f64::NAN), CiBand::BelowFloor);
        assert_eq!(format!("[{:<11}]", CiBand::Review), "[review     ]");
    }

    #[test]
    fn test_default_policy_is_valid() {
        let policy = TriagePolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.auto_pass_threshold, 0.85);
        assert_eq!(policy.review_floor, 0.65);
        assert_eq!(policy.sample_percent, 8);
    }

    #[test]
    fn test_floor_above_auto_pass_rejected() {
        let err = TriagePolicy::new(0.85, 0.9, 8).unwrap_err();
        assert!(matches!(err, TriageError::Configuration(_)));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(TriagePolicy::new(1.2, 0.65, 8).is_err());
        assert!(TriagePolicy::new(0.85, -0.1, 8).is_err());
        assert!(TriagePolicy::new(0.85, 0.65, 101).is_err());
        assert!(TriagePolicy::new(f64::NAN, 0.65, 8).is_err());
    }

    #[test]
    fn test_boundary_values_accepted() {
        assert!(TriagePolicy::new(0.0, 0.0, 0).is_ok());
        assert!(TriagePolicy::new(1.0, 1.0, 100).is_ok());
        assert!(TriagePolicy::new(0.7, 0.7, 50).is_ok());
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            TriagePolicy::default().describe(),
            "CI in [0.65, 0.85) + 8% sampling"
        );
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let policy: TriagePolicy = toml::from_str("sample_percent = 20").unwrap();
        assert_eq!(policy.sample_percent, 20);
        assert_eq!(policy.review_floor, 0.65);
    }

    #[test]
    fn test_serde_roundtrip() {
        let policy = TriagePolicy::default().with_sample_percent(12);
        let json = serde_json::to_string(&policy).unwrap();
        let back: TriagePolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy, back);
    }
}
