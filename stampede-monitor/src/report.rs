//! Bottleneck report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::recommendations::{build_recommendations, Recommendation};
use crate::severity::Severity;
use crate::types::Bottleneck;

/// Overall verdict of a bottleneck report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    HighRisk,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Warning => "WARNING",
            HealthStatus::HighRisk => "HIGH_RISK",
            HealthStatus::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub warning: u64,
    pub info: u64,
}

impl SeverityBreakdown {
    pub fn from_bottlenecks(bottlenecks: &[Bottleneck]) -> Self {
        let mut breakdown = Self::default();
        for bottleneck in bottlenecks {
            match bottleneck.severity {
                Severity::Critical => breakdown.critical += 1,
                Severity::High => breakdown.high += 1,
                Severity::Medium => breakdown.medium += 1,
                Severity::Warning => breakdown.warning += 1,
                Severity::Info => breakdown.info += 1,
            }
        }
        breakdown
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_bottlenecks: u64,
    pub critical_issues: u64,
    pub high_priority_issues: u64,
    /// Medium and warning bottlenecks
    pub warning_issues: u64,
    pub status: HealthStatus,
}

impl ReportSummary {
    pub fn from_breakdown(breakdown: &SeverityBreakdown, total: usize) -> Self {
        let warning_issues = breakdown.medium + breakdown.warning;
        let status = if breakdown.critical > 0 {
            HealthStatus::Critical
        } else if breakdown.high > 0 {
            HealthStatus::HighRisk
        } else if warning_issues > 0 {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };

        Self {
            total_bottlenecks: total as u64,
            critical_issues: breakdown.critical,
            high_priority_issues: breakdown.high,
            warning_issues,
            status,
        }
    }
}

/// Current, mean and peak of one sampled metric over the analysis window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub current: f64,
    pub average: f64,
    pub peak: f64,
}

impl MetricStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        Self {
            current: values[values.len() - 1],
            average: values.iter().sum::<f64>() / values.len() as f64,
            peak: values.iter().copied().fold(f64::MIN, f64::max),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub count: u64,
    pub average_response_time: f64,
    /// Percent of requests that errored
    pub error_rate: f64,
    pub queued: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub count: u64,
    pub average_query_time: f64,
    pub average_connections: f64,
    /// Percent of queries that errored
    pub error_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub lookups: u64,
    /// Percent of lookups that missed
    pub miss_rate: f64,
    pub average_response_time: f64,
}

/// Window statistics of everything the analyzer consumed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub sample_count: u64,
    pub cpu_usage: MetricStats,
    pub memory_usage: MetricStats,
    pub heap_usage: MetricStats,
    pub event_loop_lag: MetricStats,
    pub active_handles: MetricStats,
    pub requests: RequestStats,
    pub database: DatabaseStats,
    pub cache: CacheStats,
}

/// Snapshot of the analyzer's view of the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleneckReport {
    pub summary: ReportSummary,
    pub bottlenecks: Vec<Bottleneck>,
    pub severity_breakdown: SeverityBreakdown,
    pub recommendations: Vec<Recommendation>,
    pub metrics_summary: MetricsSummary,
    pub timestamp: DateTime<Utc>,
}

impl BottleneckReport {
    /// Assemble a report from the active bottlenecks, most severe first
    pub fn build(
        bottlenecks: Vec<Bottleneck>,
        metrics_summary: MetricsSummary,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let severity_breakdown = SeverityBreakdown::from_bottlenecks(&bottlenecks);
        let summary = ReportSummary::from_breakdown(&severity_breakdown, bottlenecks.len());
        let recommendations = build_recommendations(&bottlenecks);

        Self {
            summary,
            bottlenecks,
            severity_breakdown,
            recommendations,
            metrics_summary,
            timestamp,
        }
    }

    pub fn status(&self) -> HealthStatus {
        self.summary.status
    }

    pub fn is_healthy(&self) -> bool {
        self.summary.status == HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BottleneckType, Component};

    fn bottleneck(component: Component, severity: Severity) -> Bottleneck {
        let now = Utc::now();
        Bottleneck {
            kind: BottleneckType::System,
            component,
            metric: component.as_str().to_string(),
            value: 1.0,
            threshold: 1.0,
            severity,
            description: String::new(),
            recommendations: Vec::new(),
            occurrences: 1,
            first_seen: now,
            timestamp: now,
        }
    }

    fn status_of(severities: &[Severity]) -> HealthStatus {
        let bottlenecks: Vec<Bottleneck> = severities
            .iter()
            .map(|s| bottleneck(Component::Cpu, *s))
            .collect();
        BottleneckReport::build(bottlenecks, MetricsSummary::default(), Utc::now()).status()
    }

    #[test]
    fn test_status_precedence() {
        assert_eq!(status_of(&[]), HealthStatus::Healthy);
        assert_eq!(status_of(&[Severity::Warning]), HealthStatus::Warning);
        assert_eq!(status_of(&[Severity::Medium]), HealthStatus::Warning);
        assert_eq!(
            status_of(&[Severity::Warning, Severity::High]),
            HealthStatus::HighRisk
        );
        assert_eq!(
            status_of(&[Severity::High, Severity::Critical, Severity::Warning]),
            HealthStatus::Critical
        );
    }

    #[test]
    fn test_summary_counts() {
        let report = BottleneckReport::build(
            vec![
                bottleneck(Component::Cpu, Severity::Critical),
                bottleneck(Component::Memory, Severity::High),
                bottleneck(Component::Heap, Severity::Medium),
                bottleneck(Component::Queue, Severity::Warning),
            ],
            MetricsSummary::default(),
            Utc::now(),
        );

        assert_eq!(report.summary.total_bottlenecks, 4);
        assert_eq!(report.summary.critical_issues, 1);
        assert_eq!(report.summary.high_priority_issues, 1);
        assert_eq!(report.summary.warning_issues, 2);
        assert_eq!(report.severity_breakdown.medium, 1);
        assert!(!report.recommendations.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["status"], "CRITICAL");
        assert_eq!(json["summary"]["highPriorityIssues"], 1);
        assert!(json["severityBreakdown"].is_object());
        assert!(json["metricsSummary"]["cpuUsage"].is_object());
    }

    #[test]
    fn test_metric_stats() {
        let stats = MetricStats::from_values(&[10.0, 30.0, 20.0]);
        assert_eq!(stats.current, 20.0);
        assert_eq!(stats.average, 20.0);
        assert_eq!(stats.peak, 30.0);
        assert_eq!(MetricStats::from_values(&[]), MetricStats::default());
    }
}
