//! Result types produced by a load test run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stampede_config::{HttpMethod, TestConfiguration};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Outcome of a single HTTP request issued by a virtual user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResult {
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    /// Response status, or 0 when no response was received
    pub status_code: u16,
    /// Milliseconds from send to last body byte (or to the failure)
    pub response_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
}

/// One pass of a virtual user through a scenario
///
/// Requests run in order and the pass stops at the first failed request, so
/// `results` may be shorter than the scenario's request list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioExecution {
    pub scenario: String,
    /// Milliseconds spent executing the scenario
    pub duration: f64,
    pub results: Vec<RequestResult>,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    /// The pass was cut off by a hard stop before it finished
    ///
    /// Its completed requests still count; the pass itself does not.
    #[serde(default)]
    pub interrupted: bool,
}

/// Everything one worker reported during a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResult {
    pub worker_id: String,
    pub virtual_users: u64,
    pub executions: Vec<ScenarioExecution>,
    pub errors: Vec<String>,
}

impl WorkerResult {
    pub fn new(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.executions.iter().map(|e| e.results.len()).sum()
    }
}

/// Aggregated statistics of a run
///
/// Response time figures are computed over successful requests only and are
/// expressed in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Percentage of failed requests, 0-100
    pub error_rate: f64,
    /// Requests per second of wall-clock time
    pub throughput: f64,
    pub average_response_time: f64,
    pub median_response_time: f64,
    pub p95_response_time: f64,
    pub p99_response_time: f64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    /// Wall-clock seconds of the timed window
    pub total_duration: f64,
    /// Sum of successful response body sizes, in bytes
    pub data_transferred: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    Critical,
    Warning,
}

impl fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationSeverity::Critical => f.write_str("critical"),
            ViolationSeverity::Warning => f.write_str("warning"),
        }
    }
}

/// A test threshold the run did not meet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdViolation {
    pub metric: String,
    pub actual: f64,
    pub threshold: f64,
    pub severity: ViolationSeverity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdCheck {
    pub passed: bool,
    pub violations: Vec<ThresholdViolation>,
}

impl ThresholdCheck {
    pub fn critical_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Critical)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Warning)
            .count()
    }
}

/// Per-scenario breakdown of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStats {
    pub name: String,
    pub executions: u64,
    pub successful: u64,
    pub failed: u64,
    pub requests: u64,
    /// Mean scenario duration, in milliseconds
    pub average_duration: f64,
}

/// A worker that stopped reporting before the run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerFailure {
    pub worker_id: String,
    pub reason: String,
}

/// Complete result of a load test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub test_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub configuration: TestConfiguration,
    pub summary: TestSummary,
    pub thresholds: ThresholdCheck,
    pub scenarios: Vec<ScenarioStats>,
    /// Number of requests per status code, 0 meaning no response
    pub status_codes: BTreeMap<u16, u64>,
    #[serde(default)]
    pub worker_errors: Vec<String>,
    #[serde(default)]
    pub worker_failures: Vec<WorkerFailure>,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.thresholds.passed
    }
}
