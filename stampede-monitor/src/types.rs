//! Core monitor types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::severity::Severity;

/// One snapshot of system and runtime metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    /// System CPU load, percent
    pub cpu_usage: f64,
    /// System memory in use, percent
    pub memory_usage: f64,
    /// This process's resident memory as a share of system memory, percent
    pub heap_usage: f64,
    /// Scheduler lag in milliseconds
    pub event_loop_lag: f64,
    /// Tasks alive on the runtime
    pub active_handles: u64,
}

impl MetricSample {
    /// A zeroed sample at `timestamp`, convenient for building fixtures
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cpu_usage: 0.0,
            memory_usage: 0.0,
            heap_usage: 0.0,
            event_loop_lag: 0.0,
            active_handles: 0,
        }
    }
}

/// Dimension a bottleneck was detected in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BottleneckType {
    System,
    Application,
    Request,
    Database,
    Cache,
}

impl BottleneckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BottleneckType::System => "system",
            BottleneckType::Application => "application",
            BottleneckType::Request => "request",
            BottleneckType::Database => "database",
            BottleneckType::Cache => "cache",
        }
    }
}

impl fmt::Display for BottleneckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resource or subsystem a bottleneck points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Cpu,
    Memory,
    Heap,
    EventLoop,
    Handles,
    ResponseTime,
    ErrorRate,
    Queue,
    Database,
    Cache,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Cpu => "cpu",
            Component::Memory => "memory",
            Component::Heap => "heap",
            Component::EventLoop => "event_loop",
            Component::Handles => "handles",
            Component::ResponseTime => "response_time",
            Component::ErrorRate => "error_rate",
            Component::Queue => "queue",
            Component::Database => "database",
            Component::Cache => "cache",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a bottleneck in the active set
pub type BottleneckKey = (BottleneckType, Component, String);

/// A sustained threshold breach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    #[serde(rename = "type")]
    pub kind: BottleneckType,
    pub component: Component,
    pub metric: String,
    /// Trailing-window mean that breached
    pub value: f64,
    pub threshold: f64,
    pub severity: Severity,
    pub description: String,
    pub recommendations: Vec<String>,
    /// Number of analysis passes that found this breach
    pub occurrences: u64,
    pub first_seen: DateTime<Utc>,
    /// Last time the breach was observed
    pub timestamp: DateTime<Utc>,
}

impl Bottleneck {
    pub fn key(&self) -> BottleneckKey {
        (self.kind, self.component, self.metric.clone())
    }

    pub fn ratio(&self) -> f64 {
        if self.threshold > 0.0 {
            self.value / self.threshold
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottleneck_serializes_type_field() {
        let now = Utc::now();
        let bottleneck = Bottleneck {
            kind: BottleneckType::System,
            component: Component::EventLoop,
            metric: "eventLoopLag".to_string(),
            value: 15.0,
            threshold: 10.0,
            severity: Severity::High,
            description: "Scheduler lag high".to_string(),
            recommendations: vec![],
            occurrences: 1,
            first_seen: now,
            timestamp: now,
        };

        let value = serde_json::to_value(&bottleneck).unwrap();
        assert_eq!(value["type"], "system");
        assert_eq!(value["component"], "event_loop");
        assert_eq!(value["firstSeen"], serde_json::to_value(now).unwrap());
        assert_eq!(bottleneck.ratio(), 1.5);

        let parsed: Bottleneck = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.key(), bottleneck.key());
    }
}
