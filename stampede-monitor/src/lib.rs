//! Stampede bottleneck monitor
//!
//! Samples system and runtime metrics, accepts request, database and cache
//! metrics pushed by an instrumented service, and turns sustained threshold
//! breaches into de-duplicated [`Bottleneck`] records with severity and
//! recommendations.
//!
//! The [`BottleneckAnalyzer`] is a synchronous state machine driven by
//! explicit timestamps; [`BottleneckMonitor`] wraps it with the periodic
//! collection and analysis loops.

pub mod analyzer;
pub mod error;
pub mod events;
pub mod feed;
pub mod monitor;
pub mod recommendations;
pub mod registry;
pub mod report;
pub mod sampler;
pub mod severity;
pub mod types;

pub use analyzer::BottleneckAnalyzer;
pub use error::{MonitorError, MonitorResult};
pub use events::{EventBroadcaster, MonitorEvent};
pub use feed::{CacheMetric, DatabaseMetric, RequestMetric, TimeSeries, Timestamped};
pub use monitor::BottleneckMonitor;
pub use recommendations::Recommendation;
pub use registry::BottleneckRegistry;
pub use report::{BottleneckReport, HealthStatus, MetricsSummary, ReportSummary, SeverityBreakdown};
pub use sampler::MetricsSampler;
pub use severity::Severity;
pub use types::{Bottleneck, BottleneckKey, BottleneckType, Component, MetricSample};
