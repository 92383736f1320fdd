//! Bottleneck analyzer configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sampling cadence, analysis window and threshold table of the bottleneck analyzer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Tick of both the collection and the analysis loop, in milliseconds
    #[serde(with = "crate::domains::utils::serde_duration_millis")]
    pub sampling_interval: Duration,

    /// Trailing window averaged before comparison, in seconds
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub analysis_window: Duration,

    pub thresholds: AnalyzerThresholds,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sampling_interval: Duration::from_millis(1000),
            analysis_window: Duration::from_secs(60),
            thresholds: AnalyzerThresholds::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Samples older than this are pruned from history
    pub fn retention(&self) -> Duration {
        self.analysis_window * 2
    }

    /// Bottlenecks not re-breached for longer than this are evicted
    pub fn eviction_age(&self) -> Duration {
        self.analysis_window * 4
    }
}

/// Threshold table; a trailing mean strictly above its entry is a breach
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerThresholds {
    /// System CPU usage, percent
    pub cpu_usage: f64,
    /// System memory usage, percent
    pub memory_usage: f64,
    /// Process memory relative to its budget, percent
    pub heap_usage: f64,
    /// Scheduler lag, milliseconds
    pub event_loop_lag: f64,
    /// Mean request latency reported through the feed, milliseconds
    pub response_time: f64,
    /// Failed fed requests, percent
    pub error_rate: f64,
    /// Mean queued requests reported through the feed
    pub queue_depth: f64,
    /// Open connections (database feed) and live runtime tasks
    pub connection_count: f64,
    /// Mean database query time, milliseconds
    pub database_query_time: f64,
    /// Cache misses, percent
    pub cache_miss_rate: f64,
}

impl Default for AnalyzerThresholds {
    fn default() -> Self {
        Self {
            cpu_usage: 80.0,
            memory_usage: 85.0,
            heap_usage: 85.0,
            event_loop_lag: 10.0,
            response_time: 1000.0,
            error_rate: 5.0,
            queue_depth: 100.0,
            connection_count: 1000.0,
            database_query_time: 500.0,
            cache_miss_rate: 50.0,
        }
    }
}

impl Validatable for AnalyzerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.sampling_interval.as_millis(),
            "samplingInterval",
            self.domain_name(),
        )?;
        validate_positive(
            self.analysis_window.as_millis(),
            "analysisWindow",
            self.domain_name(),
        )?;
        if self.sampling_interval > self.analysis_window {
            return Err(self.validation_error(
                "samplingInterval cannot be longer than analysisWindow",
            ));
        }
        self.thresholds.validate()
    }

    fn domain_name(&self) -> &'static str {
        "analyzer"
    }
}

impl Validatable for AnalyzerThresholds {
    fn validate(&self) -> ConfigResult<()> {
        let entries = [
            ("cpuUsage", self.cpu_usage),
            ("memoryUsage", self.memory_usage),
            ("heapUsage", self.heap_usage),
            ("eventLoopLag", self.event_loop_lag),
            ("responseTime", self.response_time),
            ("errorRate", self.error_rate),
            ("queueDepth", self.queue_depth),
            ("connectionCount", self.connection_count),
            ("databaseQueryTime", self.database_query_time),
            ("cacheMissRate", self.cache_miss_rate),
        ];
        for (name, value) in entries {
            if !value.is_finite() {
                return Err(self.validation_error(format!("{} must be a finite number", name)));
            }
            validate_positive(value, name, self.domain_name())?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "analyzer.thresholds"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.sampling_interval, Duration::from_secs(1));
        assert_eq!(config.analysis_window, Duration::from_secs(60));
        assert_eq!(config.retention(), Duration::from_secs(120));
        assert_eq!(config.eviction_age(), Duration::from_secs(240));
        assert_eq!(config.thresholds.cpu_usage, 80.0);
        assert_eq!(config.thresholds.event_loop_lag, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_analyzer_validation() {
        let mut config = AnalyzerConfig::default();
        config.thresholds.cpu_usage = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.sampling_interval = Duration::from_secs(120);
        assert!(config.validate().is_err());
    }
}
