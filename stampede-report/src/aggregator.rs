//! Combined report across load, bottleneck and capacity results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stampede_execution::{TestReport, ViolationSeverity};
use stampede_monitor::{BottleneckReport, Severity};
use std::fmt;

use crate::capacity::CapacityProjection;

const CRITICAL_VIOLATION_PENALTY: u32 = 25;
const WARNING_VIOLATION_PENALTY: u32 = 10;
const CAPACITY_PENALTY: u32 = 10;

fn bottleneck_penalty(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 20,
        Severity::High => 10,
        Severity::Medium => 5,
        Severity::Warning => 2,
        Severity::Info => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Warning,
    Critical,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Warning => "warning",
            OverallStatus::Critical => "critical",
        };
        f.write_str(status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullReport {
    pub generated_at: DateTime<Utc>,
    /// 0 to 100
    pub score: u32,
    pub grade: Grade,
    pub status: OverallStatus,
    /// One line per penalized finding
    pub findings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_test: Option<TestReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottlenecks: Option<BottleneckReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacityProjection>,
}

/// Scores whatever parts of a full assessment are available
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAggregator;

#[derive(Default)]
struct Tally {
    penalty: u32,
    critical: bool,
    flagged: bool,
    findings: Vec<String>,
}

impl Tally {
    fn flag(&mut self, penalty: u32, critical: bool, finding: String) {
        self.penalty = self.penalty.saturating_add(penalty);
        self.critical |= critical;
        self.flagged = true;
        self.findings.push(finding);
    }
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(
        &self,
        load: Option<&TestReport>,
        bottlenecks: Option<&BottleneckReport>,
        capacity: Option<&CapacityProjection>,
    ) -> FullReport {
        let mut tally = Tally::default();

        if let Some(load) = load {
            for violation in &load.thresholds.violations {
                let (penalty, critical) = match violation.severity {
                    ViolationSeverity::Critical => (CRITICAL_VIOLATION_PENALTY, true),
                    ViolationSeverity::Warning => (WARNING_VIOLATION_PENALTY, false),
                };
                tally.flag(
                    penalty,
                    critical,
                    format!(
                        "Load test {} {}: {:.2} against threshold {:.2}",
                        violation.severity,
                        violation.metric,
                        violation.actual,
                        violation.threshold
                    ),
                );
            }
        }

        if let Some(report) = bottlenecks {
            for bottleneck in &report.bottlenecks {
                if bottleneck.severity == Severity::Info {
                    continue;
                }
                tally.flag(
                    bottleneck_penalty(bottleneck.severity),
                    bottleneck.severity == Severity::Critical,
                    format!(
                        "{} bottleneck on {}: {}",
                        bottleneck.severity, bottleneck.component, bottleneck.description
                    ),
                );
            }
        }

        if let Some(projection) = capacity {
            for metric in projection.limits_within_horizon() {
                tally.flag(
                    CAPACITY_PENALTY,
                    false,
                    format!(
                        "Capacity limit for {} projected within {} hours",
                        metric, projection.horizon_hours
                    ),
                );
            }
        }

        let score = 100u32.saturating_sub(tally.penalty);
        let status = if tally.critical {
            OverallStatus::Critical
        } else if tally.flagged {
            OverallStatus::Warning
        } else {
            OverallStatus::Healthy
        };

        FullReport {
            generated_at: Utc::now(),
            score,
            grade: Grade::from_score(score),
            status,
            findings: tally.findings,
            load_test: load.cloned(),
            bottlenecks: bottlenecks.cloned(),
            capacity: capacity.cloned(),
        }
    }
}
