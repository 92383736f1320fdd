//! Colored console summaries of finished runs

use colored::{ColoredString, Colorize};
use stampede_execution::{TestReport, ViolationSeverity};
use stampede_monitor::{BottleneckReport, HealthStatus, Severity};
use stampede_report::{CapacityProjection, FullReport, MetricTrend, OverallStatus};
use std::path::Path;

fn severity_label(severity: Severity) -> ColoredString {
    let label = severity.as_str().to_uppercase();
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.red(),
        Severity::Medium | Severity::Warning => label.yellow(),
        Severity::Info => label.normal(),
    }
}

fn health_label(status: HealthStatus) -> ColoredString {
    match status {
        HealthStatus::Healthy => status.as_str().green().bold(),
        HealthStatus::Warning => status.as_str().yellow().bold(),
        HealthStatus::HighRisk | HealthStatus::Critical => status.as_str().red().bold(),
    }
}

pub fn print_load_summary(report: &TestReport) {
    let summary = &report.summary;

    println!("\n{}", "Load test results".bold());
    println!("  Target:          {}", report.configuration.base_url);
    println!(
        "  Requests:        {} total, {} ok, {} failed",
        summary.total_requests,
        summary.successful_requests.to_string().green(),
        summary.failed_requests.to_string().red()
    );
    println!("  Error rate:      {:.2}%", summary.error_rate);
    println!("  Throughput:      {:.2} req/s", summary.throughput);
    println!(
        "  Response time:   avg {:.1}ms, median {:.1}ms, p95 {:.1}ms, p99 {:.1}ms",
        summary.average_response_time,
        summary.median_response_time,
        summary.p95_response_time,
        summary.p99_response_time
    );
    println!("  Data received:   {} bytes", summary.data_transferred);

    for scenario in &report.scenarios {
        println!(
            "  Scenario {:<12} {} runs, {} failed",
            scenario.name, scenario.executions, scenario.failed
        );
    }

    for failure in &report.worker_failures {
        println!(
            "  {} worker {}: {}",
            "Worker failure".red(),
            failure.worker_id,
            failure.reason
        );
    }

    if report.passed() {
        println!("  Thresholds:      {}", "PASSED".green().bold());
    } else {
        println!("  Thresholds:      {}", "FAILED".red().bold());
        for violation in &report.thresholds.violations {
            let label = match violation.severity {
                ViolationSeverity::Critical => "critical".red(),
                ViolationSeverity::Warning => "warning".yellow(),
            };
            println!(
                "    [{}] {} was {:.2}, threshold {:.2}",
                label, violation.metric, violation.actual, violation.threshold
            );
        }
    }
}

pub fn print_bottleneck_summary(report: &BottleneckReport) {
    println!("\n{}", "Bottleneck analysis".bold());
    println!("  Status:          {}", health_label(report.status()));
    println!(
        "  Samples:         {}",
        report.metrics_summary.sample_count
    );

    for bottleneck in &report.bottlenecks {
        println!(
            "  [{}] {}",
            severity_label(bottleneck.severity),
            bottleneck.description
        );
    }

    for recommendation in &report.recommendations {
        println!(
            "  {} {}",
            "→".cyan(),
            recommendation.title.bold()
        );
        for action in &recommendation.actions {
            println!("      - {}", action);
        }
    }
}

fn print_trend(name: &str, trend: &MetricTrend) {
    let outlook = match trend.hours_to_limit {
        Some(hours) if trend.within_horizon => format!("limit in {:.1}h", hours).red(),
        Some(hours) => format!("limit in {:.1}h", hours).normal(),
        None => "stable".green(),
    };
    println!(
        "  {:<15}  {:.2} now, {:+.3}/h, {}",
        name, trend.current, trend.slope_per_hour, outlook
    );
}

pub fn print_capacity_summary(projection: &CapacityProjection) {
    println!("\n{}", "Capacity projection".bold());
    println!("  Data points:     {}", projection.data_points);
    print_trend("CPU usage", &projection.cpu);
    print_trend("Memory usage", &projection.memory);
    print_trend("Response time", &projection.response_time);
}

pub fn print_full_summary(report: &FullReport) {
    if let Some(load) = &report.load_test {
        print_load_summary(load);
    }
    if let Some(bottlenecks) = &report.bottlenecks {
        print_bottleneck_summary(bottlenecks);
    }
    if let Some(capacity) = &report.capacity {
        print_capacity_summary(capacity);
    }

    let status = match report.status {
        OverallStatus::Healthy => report.status.to_string().green().bold(),
        OverallStatus::Warning => report.status.to_string().yellow().bold(),
        OverallStatus::Critical => report.status.to_string().red().bold(),
    };
    println!("\n{}", "Overall".bold());
    println!("  Score:           {} ({})", report.score, report.grade);
    println!("  Status:          {}", status);
    for finding in &report.findings {
        println!("  - {}", finding);
    }
}

pub fn print_saved(path: &Path) {
    println!("\n📝 Report saved to {}", path.display());
}
