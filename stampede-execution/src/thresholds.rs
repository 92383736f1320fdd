//! Pass/fail evaluation of a run against its thresholds

use stampede_config::TestThresholds;

use crate::types::{TestSummary, ThresholdCheck, ThresholdViolation, ViolationSeverity};

/// Compare a summary with the configured thresholds
///
/// Slow average responses and high error rates are critical; low throughput
/// is only a warning. The check passes when nothing was violated.
pub fn check_thresholds(summary: &TestSummary, thresholds: &TestThresholds) -> ThresholdCheck {
    let mut violations = Vec::new();

    if summary.average_response_time > thresholds.response_time {
        violations.push(ThresholdViolation {
            metric: "responseTime".to_string(),
            actual: summary.average_response_time,
            threshold: thresholds.response_time,
            severity: ViolationSeverity::Critical,
        });
    }

    if summary.error_rate > thresholds.error_rate {
        violations.push(ThresholdViolation {
            metric: "errorRate".to_string(),
            actual: summary.error_rate,
            threshold: thresholds.error_rate,
            severity: ViolationSeverity::Critical,
        });
    }

    if summary.throughput < thresholds.throughput {
        violations.push(ThresholdViolation {
            metric: "throughput".to_string(),
            actual: summary.throughput,
            threshold: thresholds.throughput,
            severity: ViolationSeverity::Warning,
        });
    }

    ThresholdCheck {
        passed: violations.is_empty(),
        violations,
    }
}
