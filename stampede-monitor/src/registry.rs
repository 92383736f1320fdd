//! Active bottleneck registry with upsert and eviction

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::feed::cutoff;
use crate::severity::Severity;
use crate::types::{Bottleneck, BottleneckKey, BottleneckType, Component};

/// A breach found by one analysis pass, before it is merged into the registry
#[derive(Debug, Clone, PartialEq)]
pub struct Breach {
    pub kind: BottleneckType,
    pub component: Component,
    pub metric: &'static str,
    pub value: f64,
    pub threshold: f64,
    pub severity: Severity,
    pub description: String,
    pub recommendations: Vec<String>,
}

/// Set of active bottlenecks, unique by `(type, component, metric)`
#[derive(Debug, Default)]
pub struct BottleneckRegistry {
    entries: BTreeMap<BottleneckKey, Bottleneck>,
}

impl BottleneckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new bottleneck or refresh the existing one with the same identity
    ///
    /// A refresh keeps `first_seen`, bumps `occurrences` and takes the latest
    /// value, threshold, severity and description.
    pub fn upsert(&mut self, breach: Breach, now: DateTime<Utc>) -> Bottleneck {
        let key = (breach.kind, breach.component, breach.metric.to_string());

        let entry = self
            .entries
            .entry(key)
            .and_modify(|existing| {
                existing.value = breach.value;
                existing.threshold = breach.threshold;
                existing.severity = breach.severity;
                existing.description = breach.description.clone();
                existing.recommendations = breach.recommendations.clone();
                existing.occurrences += 1;
                existing.timestamp = now;
            })
            .or_insert_with(|| {
                debug!(
                    "New {} bottleneck on {} ({})",
                    breach.severity, breach.component, breach.metric
                );
                Bottleneck {
                    kind: breach.kind,
                    component: breach.component,
                    metric: breach.metric.to_string(),
                    value: breach.value,
                    threshold: breach.threshold,
                    severity: breach.severity,
                    description: breach.description.clone(),
                    recommendations: breach.recommendations.clone(),
                    occurrences: 1,
                    first_seen: now,
                    timestamp: now,
                }
            });

        entry.clone()
    }

    /// Remove bottlenecks not re-breached for more than `max_age`
    pub fn evict_stale(&mut self, now: DateTime<Utc>, max_age: Duration) -> Vec<Bottleneck> {
        let oldest = cutoff(now, max_age);
        let stale: Vec<BottleneckKey> = self
            .entries
            .iter()
            .filter(|(_, b)| b.timestamp < oldest)
            .map(|(key, _)| key.clone())
            .collect();

        stale
            .into_iter()
            .filter_map(|key| self.entries.remove(&key))
            .inspect(|b| debug!("Evicted {} bottleneck ({})", b.component, b.metric))
            .collect()
    }

    /// Active bottlenecks, most severe first
    pub fn active(&self) -> Vec<Bottleneck> {
        let mut active: Vec<Bottleneck> = self.entries.values().cloned().collect();
        active.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.ratio().total_cmp(&a.ratio()))
        });
        active
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn breach(value: f64) -> Breach {
        Breach {
            kind: BottleneckType::System,
            component: Component::Cpu,
            metric: "cpuUsage",
            value,
            threshold: 80.0,
            severity: Severity::classify(value, 80.0).unwrap_or(Severity::Info),
            description: format!("CPU usage at {:.1}%", value),
            recommendations: vec!["Scale horizontally".to_string()],
        }
    }

    #[test]
    fn test_upsert_keeps_identity_unique() {
        let mut registry = BottleneckRegistry::new();
        let t0 = Utc::now();
        let t1 = t0 + ChronoDuration::seconds(1);

        let first = registry.upsert(breach(92.0), t0);
        assert_eq!(first.occurrences, 1);
        assert_eq!(first.severity, Severity::Warning);

        let second = registry.upsert(breach(170.0), t1);
        assert_eq!(registry.len(), 1);
        assert_eq!(second.occurrences, 2);
        assert_eq!(second.first_seen, t0);
        assert_eq!(second.timestamp, t1);
        assert_eq!(second.value, 170.0);
        assert_eq!(second.severity, Severity::Critical);
    }

    #[test]
    fn test_distinct_metrics_are_distinct_entries() {
        let mut registry = BottleneckRegistry::new();
        let now = Utc::now();
        registry.upsert(breach(92.0), now);
        registry.upsert(
            Breach {
                component: Component::Memory,
                metric: "memoryUsage",
                threshold: 85.0,
                ..breach(90.0)
            },
            now,
        );

        assert_eq!(registry.len(), 2);
        assert!(registry
            .entries
            .get(&(BottleneckType::System, Component::Cpu, "cpuUsage".to_string()))
            .is_some());
    }

    #[test]
    fn test_eviction_after_max_age() {
        let mut registry = BottleneckRegistry::new();
        let t0 = Utc::now();
        registry.upsert(breach(92.0), t0);

        let max_age = Duration::from_secs(240);
        let at_limit = t0 + ChronoDuration::seconds(240);
        assert!(registry.evict_stale(at_limit, max_age).is_empty());
        assert_eq!(registry.len(), 1);

        let past_limit = t0 + ChronoDuration::seconds(241);
        let evicted = registry.evict_stale(past_limit, max_age);
        assert_eq!(evicted.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_active_sorted_by_severity() {
        let mut registry = BottleneckRegistry::new();
        let now = Utc::now();
        registry.upsert(breach(92.0), now);
        registry.upsert(
            Breach {
                kind: BottleneckType::Request,
                component: Component::ResponseTime,
                metric: "responseTime",
                threshold: 1000.0,
                severity: Severity::Critical,
                ..breach(2500.0)
            },
            now,
        );

        let active = registry.active();
        assert_eq!(active[0].component, Component::ResponseTime);
        assert_eq!(active[1].component, Component::Cpu);
    }
}
