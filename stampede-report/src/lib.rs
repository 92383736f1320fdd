//! Stampede reporting
//!
//! Combines load-test results, bottleneck analysis and capacity projections
//! into a single scored [`FullReport`], and persists any report as a
//! timestamped JSON file.

pub mod aggregator;
pub mod capacity;
pub mod error;
pub mod persist;

pub use aggregator::{FullReport, Grade, OverallStatus, ReportAggregator};
pub use capacity::{
    CapacityDataPoint, CapacityPlanner, CapacityProjection, LinearTrendPlanner, MetricTrend,
};
pub use error::{ReportError, ReportResult};
pub use persist::{read_report, report_file_name, write_report, ReportWriter};
