//! Bottleneck analysis over trailing metric windows

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use stampede_config::{AnalyzerConfig, AnalyzerThresholds, Validatable};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::MonitorResult;
use crate::events::{EventBroadcaster, MonitorEvent};
use crate::feed::{mean, CacheMetric, DatabaseMetric, RequestMetric, TimeSeries};
use crate::recommendations::component_recommendations;
use crate::registry::{BottleneckRegistry, Breach};
use crate::report::{
    BottleneckReport, CacheStats, DatabaseStats, MetricStats, MetricsSummary, RequestStats,
};
use crate::severity::Severity;
use crate::types::{Bottleneck, BottleneckType, Component, MetricSample};

#[derive(Debug, Default)]
struct AnalyzerState {
    samples: TimeSeries<MetricSample>,
    requests: TimeSeries<RequestMetric>,
    database: TimeSeries<DatabaseMetric>,
    cache: TimeSeries<CacheMetric>,
    registry: BottleneckRegistry,
}

impl AnalyzerState {
    fn prune(&mut self, now: DateTime<Utc>, retention: Duration) {
        let removed = self.samples.prune(now, retention)
            + self.requests.prune(now, retention)
            + self.database.prune(now, retention)
            + self.cache.prune(now, retention);
        if removed > 0 {
            debug!("Pruned {} metric entries older than {}s", removed, retention.as_secs());
        }
    }
}

/// Percentage of `flagged` among `total`, `None` when there is nothing to rate
fn percent(flagged: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| flagged as f64 / total as f64 * 100.0)
}

/// One metric to compare against its threshold
struct Check {
    kind: BottleneckType,
    component: Component,
    metric: &'static str,
    label: &'static str,
    unit: &'static str,
    value: Option<f64>,
    threshold: f64,
}

impl Check {
    fn evaluate(self, window: Duration) -> Option<Breach> {
        let value = self.value?;
        let severity = Severity::classify(value, self.threshold)?;
        Some(Breach {
            kind: self.kind,
            component: self.component,
            metric: self.metric,
            value,
            threshold: self.threshold,
            severity,
            description: format!(
                "{} averaged {:.1}{} over the last {}s (threshold {}{})",
                self.label,
                value,
                self.unit,
                window.as_secs(),
                self.threshold,
                self.unit
            ),
            recommendations: component_recommendations(self.component),
        })
    }
}

/// Classifies sustained threshold breaches into bottlenecks
///
/// All state sits behind one lock. Every method takes the current time
/// explicitly, so the analyzer can be driven by a clock or by recorded data.
pub struct BottleneckAnalyzer {
    config: AnalyzerConfig,
    state: Mutex<AnalyzerState>,
    events: EventBroadcaster,
}

impl BottleneckAnalyzer {
    pub fn new(config: AnalyzerConfig) -> MonitorResult<Self> {
        Self::with_events(config, EventBroadcaster::new())
    }

    pub fn with_events(config: AnalyzerConfig, events: EventBroadcaster) -> MonitorResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(AnalyzerState::default()),
            events,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    /// Append a system sample and prune history older than the retention
    pub fn record_sample(&self, sample: MetricSample) {
        let now = sample.timestamp;
        let mut state = self.state.lock();
        state.samples.push(sample);
        state.prune(now, self.config.retention());
    }

    /// Append an observed request, pruning request history past the retention
    pub fn add_request_metric(&self, metric: RequestMetric) {
        let now = metric.timestamp;
        let mut state = self.state.lock();
        state.requests.push(metric);
        state.requests.prune(now, self.config.retention());
    }

    pub fn add_database_metric(&self, metric: DatabaseMetric) {
        let now = metric.timestamp;
        let mut state = self.state.lock();
        state.database.push(metric);
        state.database.prune(now, self.config.retention());
    }

    pub fn add_cache_metric(&self, metric: CacheMetric) {
        let now = metric.timestamp;
        let mut state = self.state.lock();
        state.cache.push(metric);
        state.cache.prune(now, self.config.retention());
    }

    pub fn sample_count(&self) -> usize {
        self.state.lock().samples.len()
    }

    /// Retained samples, oldest first
    pub fn samples(&self) -> Vec<MetricSample> {
        self.state.lock().samples.iter().cloned().collect()
    }

    fn checks(state: &AnalyzerState, t: &AnalyzerThresholds, now: DateTime<Utc>, window: Duration) -> Vec<Check> {
        let samples: Vec<&MetricSample> = state.samples.window(now, window).collect();
        let requests: Vec<&RequestMetric> = state.requests.window(now, window).collect();
        let queries: Vec<&DatabaseMetric> = state.database.window(now, window).collect();
        let lookups: Vec<&CacheMetric> = state.cache.window(now, window).collect();

        vec![
            Check {
                kind: BottleneckType::System,
                component: Component::Cpu,
                metric: "cpuUsage",
                label: "CPU usage",
                unit: "%",
                value: mean(samples.iter().map(|s| s.cpu_usage)),
                threshold: t.cpu_usage,
            },
            Check {
                kind: BottleneckType::System,
                component: Component::Memory,
                metric: "memoryUsage",
                label: "Memory usage",
                unit: "%",
                value: mean(samples.iter().map(|s| s.memory_usage)),
                threshold: t.memory_usage,
            },
            Check {
                kind: BottleneckType::Application,
                component: Component::Heap,
                metric: "heapUsage",
                label: "Process memory",
                unit: "%",
                value: mean(samples.iter().map(|s| s.heap_usage)),
                threshold: t.heap_usage,
            },
            Check {
                kind: BottleneckType::Application,
                component: Component::EventLoop,
                metric: "eventLoopLag",
                label: "Scheduler lag",
                unit: "ms",
                value: mean(samples.iter().map(|s| s.event_loop_lag)),
                threshold: t.event_loop_lag,
            },
            Check {
                kind: BottleneckType::Application,
                component: Component::Handles,
                metric: "activeHandles",
                label: "Active handles",
                unit: "",
                value: mean(samples.iter().map(|s| s.active_handles as f64)),
                threshold: t.connection_count,
            },
            Check {
                kind: BottleneckType::Request,
                component: Component::ResponseTime,
                metric: "responseTime",
                label: "Response time",
                unit: "ms",
                value: mean(requests.iter().map(|r| r.response_time)),
                threshold: t.response_time,
            },
            Check {
                kind: BottleneckType::Request,
                component: Component::ErrorRate,
                metric: "errorRate",
                label: "Error rate",
                unit: "%",
                value: percent(requests.iter().filter(|r| r.error).count(), requests.len()),
                threshold: t.error_rate,
            },
            Check {
                kind: BottleneckType::Request,
                component: Component::Queue,
                metric: "queueDepth",
                label: "Queued requests",
                unit: "",
                value: (!requests.is_empty())
                    .then(|| requests.iter().filter(|r| r.queued).count() as f64),
                threshold: t.queue_depth,
            },
            Check {
                kind: BottleneckType::Database,
                component: Component::Database,
                metric: "queryTime",
                label: "Query time",
                unit: "ms",
                value: mean(queries.iter().map(|q| q.query_time)),
                threshold: t.database_query_time,
            },
            Check {
                kind: BottleneckType::Database,
                component: Component::Database,
                metric: "connectionCount",
                label: "Database connections",
                unit: "",
                value: mean(queries.iter().map(|q| q.connections as f64)),
                threshold: t.connection_count,
            },
            Check {
                kind: BottleneckType::Cache,
                component: Component::Cache,
                metric: "missRate",
                label: "Cache miss rate",
                unit: "%",
                value: percent(lookups.iter().filter(|c| !c.hit).count(), lookups.len()),
                threshold: t.cache_miss_rate,
            },
        ]
    }

    /// Run one analysis pass at `now`
    ///
    /// Every breach is upserted and announced, then bottlenecks not
    /// re-breached within the eviction age are dropped. Returns the active
    /// set after the pass.
    pub fn analyze(&self, now: DateTime<Utc>) -> Vec<Bottleneck> {
        let window = self.config.analysis_window;

        let (detected, active) = {
            let mut state = self.state.lock();
            state.prune(now, self.config.retention());

            let breaches: Vec<Breach> = Self::checks(&state, &self.config.thresholds, now, window)
                .into_iter()
                .filter_map(|check| check.evaluate(window))
                .collect();

            let detected: Vec<Bottleneck> = breaches
                .into_iter()
                .map(|breach| state.registry.upsert(breach, now))
                .collect();

            for evicted in state.registry.evict_stale(now, self.config.eviction_age()) {
                info!(
                    "Bottleneck on {} ({}) resolved after {} occurrences",
                    evicted.component, evicted.metric, evicted.occurrences
                );
            }

            (detected, state.registry.active())
        };

        for bottleneck in &detected {
            if bottleneck.occurrences == 1 {
                info!(
                    "Detected {} {} bottleneck: {}",
                    bottleneck.severity, bottleneck.component, bottleneck.description
                );
            }
            self.events.broadcast(MonitorEvent::BottleneckDetected {
                bottleneck: bottleneck.clone(),
            });
        }

        self.events.broadcast(MonitorEvent::AnalysisComplete {
            timestamp: now,
            bottlenecks: active.clone(),
        });

        active
    }

    pub fn active_bottlenecks(&self) -> Vec<Bottleneck> {
        self.state.lock().registry.active()
    }

    /// Statistics of the trailing window ending at `now`
    pub fn metrics_summary(&self, now: DateTime<Utc>) -> MetricsSummary {
        let window = self.config.analysis_window;
        let state = self.state.lock();

        let samples: Vec<&MetricSample> = state.samples.window(now, window).collect();
        let series = |f: fn(&MetricSample) -> f64| -> MetricStats {
            let values: Vec<f64> = samples.iter().map(|s| f(s)).collect();
            MetricStats::from_values(&values)
        };

        let requests: Vec<&RequestMetric> = state.requests.window(now, window).collect();
        let queries: Vec<&DatabaseMetric> = state.database.window(now, window).collect();
        let lookups: Vec<&CacheMetric> = state.cache.window(now, window).collect();

        MetricsSummary {
            sample_count: samples.len() as u64,
            cpu_usage: series(|s| s.cpu_usage),
            memory_usage: series(|s| s.memory_usage),
            heap_usage: series(|s| s.heap_usage),
            event_loop_lag: series(|s| s.event_loop_lag),
            active_handles: series(|s| s.active_handles as f64),
            requests: RequestStats {
                count: requests.len() as u64,
                average_response_time: mean(requests.iter().map(|r| r.response_time))
                    .unwrap_or(0.0),
                error_rate: percent(requests.iter().filter(|r| r.error).count(), requests.len())
                    .unwrap_or(0.0),
                queued: requests.iter().filter(|r| r.queued).count() as u64,
            },
            database: DatabaseStats {
                count: queries.len() as u64,
                average_query_time: mean(queries.iter().map(|q| q.query_time)).unwrap_or(0.0),
                average_connections: mean(queries.iter().map(|q| q.connections as f64))
                    .unwrap_or(0.0),
                error_rate: percent(queries.iter().filter(|q| q.error).count(), queries.len())
                    .unwrap_or(0.0),
            },
            cache: CacheStats {
                lookups: lookups.len() as u64,
                miss_rate: percent(lookups.iter().filter(|c| !c.hit).count(), lookups.len())
                    .unwrap_or(0.0),
                average_response_time: mean(lookups.iter().map(|c| c.response_time))
                    .unwrap_or(0.0),
            },
        }
    }

    /// Report on the currently active bottlenecks
    ///
    /// Stale bottlenecks are evicted first, so the report never shows an
    /// entry older than the eviction age.
    pub fn report(&self, now: DateTime<Utc>) -> BottleneckReport {
        let bottlenecks = {
            let mut state = self.state.lock();
            state.registry.evict_stale(now, self.config.eviction_age());
            state.registry.active()
        };
        BottleneckReport::build(bottlenecks, self.metrics_summary(now), now)
    }
}
