//! Capacity projection from historical resource measurements

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stampede_config::CapacityConfig;
use stampede_monitor::MetricSample;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// One historical observation of the system under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityDataPoint {
    pub timestamp: DateTime<Utc>,
    /// Percent
    pub cpu_usage: f64,
    /// Percent
    pub memory_usage: f64,
    /// Milliseconds
    pub response_time: f64,
}

impl CapacityDataPoint {
    pub fn from_sample(sample: &MetricSample, response_time: f64) -> Self {
        Self {
            timestamp: sample.timestamp,
            cpu_usage: sample.cpu_usage,
            memory_usage: sample.memory_usage,
            response_time,
        }
    }
}

/// Linear trend of one metric towards its limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTrend {
    pub current: f64,
    pub slope_per_hour: f64,
    pub limit: f64,
    /// `None` when the trend never reaches the limit
    pub hours_to_limit: Option<f64>,
    pub within_horizon: bool,
}

impl MetricTrend {
    fn new(current: f64, slope_per_hour: f64, limit: f64, horizon_hours: f64) -> Self {
        let hours_to_limit = if current >= limit {
            Some(0.0)
        } else if slope_per_hour > 0.0 {
            Some((limit - current) / slope_per_hour)
        } else {
            None
        };

        Self {
            current,
            slope_per_hour,
            limit,
            hours_to_limit,
            within_horizon: hours_to_limit.is_some_and(|hours| hours <= horizon_hours),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityProjection {
    pub generated_at: DateTime<Utc>,
    pub data_points: usize,
    pub horizon_hours: f64,
    pub cpu: MetricTrend,
    pub memory: MetricTrend,
    pub response_time: MetricTrend,
}

impl CapacityProjection {
    /// Names of the metrics projected to reach their limit inside the horizon
    pub fn limits_within_horizon(&self) -> Vec<&'static str> {
        [
            ("cpuUsage", &self.cpu),
            ("memoryUsage", &self.memory),
            ("responseTime", &self.response_time),
        ]
        .into_iter()
        .filter(|(_, trend)| trend.within_horizon)
        .map(|(name, _)| name)
        .collect()
    }

    pub fn at_risk(&self) -> bool {
        !self.limits_within_horizon().is_empty()
    }
}

/// Projects future resource needs from past observations
pub trait CapacityPlanner: Send + Sync {
    fn project(&self, points: &[CapacityDataPoint]) -> CapacityProjection;
}

/// Least-squares line through each metric over time
#[derive(Debug, Clone, Default)]
pub struct LinearTrendPlanner {
    config: CapacityConfig,
}

impl LinearTrendPlanner {
    pub fn new(config: CapacityConfig) -> Self {
        Self { config }
    }

    fn trend(&self, points: &[CapacityDataPoint], metric: fn(&CapacityDataPoint) -> f64, limit: f64) -> MetricTrend {
        let current = points.last().map(metric).unwrap_or(0.0);
        let Some(first) = points.first() else {
            return MetricTrend::new(current, 0.0, limit, self.config.horizon_hours);
        };

        let series: Vec<(f64, f64)> = points
            .iter()
            .map(|point| {
                let hours =
                    (point.timestamp - first.timestamp).num_milliseconds() as f64 / MILLIS_PER_HOUR;
                (hours, metric(point))
            })
            .collect();

        MetricTrend::new(
            current,
            least_squares_slope(&series),
            limit,
            self.config.horizon_hours,
        )
    }
}

impl CapacityPlanner for LinearTrendPlanner {
    fn project(&self, points: &[CapacityDataPoint]) -> CapacityProjection {
        let mut sorted = points.to_vec();
        sorted.sort_by_key(|point| point.timestamp);

        CapacityProjection {
            generated_at: Utc::now(),
            data_points: sorted.len(),
            horizon_hours: self.config.horizon_hours,
            cpu: self.trend(&sorted, |p| p.cpu_usage, self.config.cpu_limit),
            memory: self.trend(&sorted, |p| p.memory_usage, self.config.memory_limit),
            response_time: self.trend(&sorted, |p| p.response_time, self.config.response_time_limit),
        }
    }
}

/// Slope of the least-squares fit, 0 when x has no spread
fn least_squares_slope(series: &[(f64, f64)]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }

    let n = series.len() as f64;
    let mean_x = series.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = series.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (covariance, variance) = series.iter().fold((0.0, 0.0), |(cov, var), (x, y)| {
        let dx = x - mean_x;
        (cov + dx * (y - mean_y), var + dx * dx)
    });

    if variance == 0.0 {
        0.0
    } else {
        covariance / variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn hourly(values: &[(f64, f64, f64)]) -> Vec<CapacityDataPoint> {
        let start = Utc::now() - ChronoDuration::hours(values.len() as i64);
        values
            .iter()
            .enumerate()
            .map(|(i, (cpu, memory, response))| CapacityDataPoint {
                timestamp: start + ChronoDuration::hours(i as i64),
                cpu_usage: *cpu,
                memory_usage: *memory,
                response_time: *response,
            })
            .collect()
    }

    #[test]
    fn test_growing_cpu_reaches_limit() {
        let points = hourly(&[(40.0, 50.0, 200.0), (42.0, 50.0, 200.0), (44.0, 50.0, 200.0)]);
        let projection = LinearTrendPlanner::default().project(&points);

        assert_eq!(projection.data_points, 3);
        assert!((projection.cpu.slope_per_hour - 2.0).abs() < 1e-9);
        assert_eq!(projection.cpu.current, 44.0);
        // 36 points to go at 2 per hour
        assert!((projection.cpu.hours_to_limit.unwrap() - 18.0).abs() < 1e-9);
        assert!(projection.cpu.within_horizon);

        assert_eq!(projection.memory.slope_per_hour, 0.0);
        assert_eq!(projection.memory.hours_to_limit, None);
        assert_eq!(projection.limits_within_horizon(), vec!["cpuUsage"]);
        assert!(projection.at_risk());
    }

    #[test]
    fn test_decreasing_trend_never_reaches_limit() {
        let points = hourly(&[(60.0, 60.0, 900.0), (50.0, 55.0, 800.0)]);
        let projection = LinearTrendPlanner::default().project(&points);

        assert!(projection.cpu.slope_per_hour < 0.0);
        assert_eq!(projection.cpu.hours_to_limit, None);
        assert!(!projection.at_risk());
    }

    #[test]
    fn test_limit_already_exceeded() {
        let points = hourly(&[(95.0, 20.0, 100.0)]);
        let projection = LinearTrendPlanner::default().project(&points);

        assert_eq!(projection.cpu.hours_to_limit, Some(0.0));
        assert!(projection.cpu.within_horizon);
    }

    #[test]
    fn test_trend_beyond_horizon() {
        let config = CapacityConfig {
            horizon_hours: 10.0,
            ..CapacityConfig::default()
        };
        let points = hourly(&[(10.0, 10.0, 100.0), (11.0, 10.0, 100.0)]);
        let projection = LinearTrendPlanner::new(config).project(&points);

        assert!((projection.cpu.hours_to_limit.unwrap() - 69.0).abs() < 1e-9);
        assert!(!projection.cpu.within_horizon);
    }

    #[test]
    fn test_no_history() {
        let projection = LinearTrendPlanner::default().project(&[]);
        assert_eq!(projection.data_points, 0);
        assert_eq!(projection.cpu.current, 0.0);
        assert!(!projection.at_risk());
    }

    #[test]
    fn test_unordered_points_are_sorted() {
        let mut points = hourly(&[(40.0, 50.0, 200.0), (42.0, 50.0, 200.0), (44.0, 50.0, 200.0)]);
        points.reverse();
        let projection = LinearTrendPlanner::default().project(&points);
        assert_eq!(projection.cpu.current, 44.0);
        assert!((projection.cpu.slope_per_hour - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_data_point_json_shape() {
        let json = serde_json::json!([
            {"timestamp": "2026-01-01T00:00:00Z", "cpuUsage": 50.0, "memoryUsage": 40.0, "responseTime": 120.0}
        ]);
        let points: Vec<CapacityDataPoint> = serde_json::from_value(json).unwrap();
        assert_eq!(points[0].response_time, 120.0);
    }
}
