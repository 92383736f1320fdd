//! Monitor, load test, aggregation and persistence working together

mod common;

use chrono::Utc;
use common::{quick_test, spawn_target};
use stampede_config::{AnalyzerConfig, CapacityConfig, HttpConfig};
use stampede_execution::{run_load_test, TestReport};
use stampede_monitor::{
    BottleneckMonitor, BottleneckReport, BottleneckType, DatabaseMetric, MonitorEvent,
};
use stampede_report::{
    read_report, CapacityDataPoint, CapacityPlanner, FullReport, LinearTrendPlanner,
    OverallStatus, ReportAggregator, ReportWriter,
};
use std::time::Duration;

fn fast_analyzer() -> AnalyzerConfig {
    AnalyzerConfig {
        sampling_interval: Duration::from_millis(100),
        analysis_window: Duration::from_secs(2),
        ..AnalyzerConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_assessment_is_persisted() {
    let (base_url, _hits) = spawn_target().await;
    let output = tempfile::TempDir::new().unwrap();

    let monitor = BottleneckMonitor::new(fast_analyzer()).unwrap();
    monitor.start().unwrap();
    let load = run_load_test(quick_test(&base_url, "/api/items", 2), &HttpConfig::default())
        .await
        .unwrap();
    let bottlenecks = monitor.stop().await.unwrap();

    let samples = monitor.analyzer().samples();
    assert!(samples.len() >= 5);

    let points: Vec<CapacityDataPoint> = samples
        .iter()
        .map(|sample| CapacityDataPoint::from_sample(sample, load.summary.average_response_time))
        .collect();
    let projection = LinearTrendPlanner::new(CapacityConfig::default()).project(&points);
    assert_eq!(projection.data_points, samples.len());

    let full = ReportAggregator::new().aggregate(Some(&load), Some(&bottlenecks), Some(&projection));
    assert!(full.score <= 100);
    assert_eq!(full.findings.is_empty(), full.status == OverallStatus::Healthy);

    let writer = ReportWriter::new(output.path().join("reports"));
    let path = writer.write("full", &full).await.unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("full_"));

    let restored: FullReport = read_report(&path).await.unwrap();
    assert_eq!(restored.score, full.score);
    assert_eq!(restored.grade, full.grade);
    assert_eq!(restored.status, full.status);
    let restored_load = restored.load_test.unwrap();
    assert_eq!(restored_load.summary, load.summary);
    assert_eq!(restored_load.test_id, load.test_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_database_is_reported() {
    let output = tempfile::TempDir::new().unwrap();
    let monitor = BottleneckMonitor::new(fast_analyzer()).unwrap();
    let mut events = monitor.subscribe();

    monitor.start().unwrap();
    for _ in 0..20 {
        monitor.add_database_metric(DatabaseMetric::new(1200.0, 5, false));
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    let report = monitor.stop().await.unwrap();

    let database = report
        .bottlenecks
        .iter()
        .find(|b| b.kind == BottleneckType::Database)
        .unwrap();
    assert_eq!(database.metric, "queryTime");
    assert!(database.occurrences >= 1);
    assert!(!report.is_healthy());

    let mut detected = false;
    while let Ok(event) = events.try_recv() {
        if let MonitorEvent::BottleneckDetected { bottleneck } = event {
            detected |= bottleneck.kind == BottleneckType::Database;
        }
    }
    assert!(detected);

    let path = ReportWriter::new(output.path())
        .write("bottleneck", &report)
        .await
        .unwrap();
    let restored: BottleneckReport = read_report(&path).await.unwrap();
    assert_eq!(restored.summary, report.summary);
    assert_eq!(restored.bottlenecks.len(), report.bottlenecks.len());
}

#[tokio::test]
async fn test_load_report_round_trips_through_disk() {
    let output = tempfile::TempDir::new().unwrap();
    let report_json = serde_json::json!({
        "testId": "6f1c2a4e-8d55-4bb4-9a3e-8b3f0a6b1d10",
        "startedAt": Utc::now(),
        "endedAt": Utc::now(),
        "configuration": { "baseURL": "http://localhost:3000" },
        "summary": {
            "totalRequests": 100,
            "successfulRequests": 98,
            "failedRequests": 2,
            "errorRate": 2.0,
            "throughput": 20.0,
            "averageResponseTime": 42.5,
            "medianResponseTime": 40.0,
            "p95ResponseTime": 80.0,
            "p99ResponseTime": 95.0,
            "minResponseTime": 10.0,
            "maxResponseTime": 99.0,
            "totalDuration": 5.0,
            "dataTransferred": 4096
        },
        "thresholds": { "passed": true, "violations": [] },
        "scenarios": [],
        "statusCodes": { "200": 98, "0": 2 }
    });
    let report: TestReport = serde_json::from_value(report_json).unwrap();

    let path = ReportWriter::new(output.path())
        .write("load", &report)
        .await
        .unwrap();
    let restored: TestReport = read_report(&path).await.unwrap();

    assert_eq!(restored, report);
    assert_eq!(restored.status_codes.get(&0).copied(), Some(2));
}
