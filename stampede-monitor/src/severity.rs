//! Severity classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// How far a metric is past its threshold
///
/// Ordered from least to most severe, so `max()` picks the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Classify `value / threshold`
    ///
    /// `>= 2` critical, `>= 1.5` high, `>= 1.2` medium, `>= 1` warning,
    /// anything lower is informational.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 2.0 {
            Severity::Critical
        } else if ratio >= 1.5 {
            Severity::High
        } else if ratio >= 1.2 {
            Severity::Medium
        } else if ratio >= 1.0 {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    /// Classify a metric value against its threshold
    ///
    /// Returns `None` unless the value strictly exceeds the threshold.
    pub fn classify(value: f64, threshold: f64) -> Option<Self> {
        if value.is_nan() || value <= threshold || threshold <= 0.0 {
            return None;
        }
        Some(Self::from_ratio(value / threshold))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
