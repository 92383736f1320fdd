//! Load test coordinator

use chrono::Utc;
use stampede_config::{
    ConfigLoader, HttpConfig, HttpMethod, RequestSpec, TestConfiguration, Validatable,
};
use stampede_http::ClientSettings;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ExecutionResult;
use crate::ipc::CoordinatorMessage;
use crate::stats::{scenario_breakdown, status_distribution, summarize, ResultCollector};
use crate::thresholds::check_thresholds;
use crate::types::TestReport;
use crate::worker::{ClientFactory, HttpClientFactory, WorkerPool};

/// Path requested during warmup
pub const WARMUP_PATH: &str = "/api/health";

/// Number of untracked warmup requests
pub const WARMUP_REQUESTS: usize = 10;

/// Runs one load test from validation to report
pub struct Coordinator {
    config: Arc<TestConfiguration>,
    client_factory: Arc<dyn ClientFactory>,
}

impl Coordinator {
    /// Validate `config` and prepare a coordinator using `reqwest` clients
    pub fn new(config: TestConfiguration, http: &HttpConfig) -> ExecutionResult<Self> {
        let settings = ClientSettings::for_test(http, &config);
        Self::with_client_factory(config, Arc::new(HttpClientFactory::new(settings)))
    }

    /// Validate `config` and prepare a coordinator with a custom client factory
    pub fn with_client_factory(
        config: TestConfiguration,
        client_factory: Arc<dyn ClientFactory>,
    ) -> ExecutionResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            client_factory,
        })
    }

    pub fn config(&self) -> &TestConfiguration {
        &self.config
    }

    /// Issue untracked health checks so connections and the target are warm
    ///
    /// Failures are logged and never abort the run.
    pub async fn warmup(&self) {
        let client = match self.client_factory.create() {
            Ok(client) => client,
            Err(e) => {
                warn!("Skipping warmup, could not build HTTP client: {}", e);
                return;
            }
        };

        let url = self.config.url_for(WARMUP_PATH);
        let request = RequestSpec::new(HttpMethod::Get, WARMUP_PATH);
        info!("Warming up with {} requests to {}", WARMUP_REQUESTS, url);

        let mut failures = 0;
        for _ in 0..WARMUP_REQUESTS {
            if let Err(e) = client.execute(&url, &request).await {
                failures += 1;
                debug!("Warmup request failed: {}", e);
            }
        }

        if failures > 0 {
            warn!(
                "{} of {} warmup requests to {} failed",
                failures, WARMUP_REQUESTS, url
            );
        }
    }

    /// Run the load test and build its report
    pub async fn run_load_test(&self) -> ExecutionResult<TestReport> {
        let config = &self.config;
        let test_id = Uuid::new_v4();
        info!(
            "Starting load test {} against {}: {} users, {} workers, {}s",
            test_id,
            config.base_url,
            config.concurrency,
            config.worker_count,
            config.duration.as_secs()
        );

        if config.warmup {
            self.warmup().await;
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<CoordinatorMessage>();
        let started_at = Utc::now();
        let started = Instant::now();

        let pool = WorkerPool::start(Arc::clone(config), Arc::clone(&self.client_factory), tx)?;
        let mut collector = ResultCollector::new();

        let deadline = tokio::time::sleep(config.duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    debug!("Test duration elapsed");
                    break;
                }
                message = rx.recv() => match message {
                    Some(message) => collector.handle(message),
                    None => {
                        warn!("All workers exited before the test duration elapsed");
                        break;
                    }
                },
            }
        }

        let worker_failures = pool.shutdown(config.shutdown).await;
        let wall_clock = started.elapsed();
        let ended_at = Utc::now();

        // Messages that were already delivered before the workers stopped
        while let Ok(message) = rx.try_recv() {
            collector.handle(message);
        }

        let workers = collector.into_worker_results();
        let executions: Vec<_> = workers.iter().flat_map(|w| w.executions.iter()).collect();

        let summary = summarize(executions.iter().copied(), wall_clock);
        let thresholds = check_thresholds(&summary, &config.thresholds);

        info!(
            "Load test {} finished: {} requests, {:.2}% errors, {:.2} req/s, {}",
            test_id,
            summary.total_requests,
            summary.error_rate,
            summary.throughput,
            if thresholds.passed { "passed" } else { "failed" }
        );

        Ok(TestReport {
            test_id,
            started_at,
            ended_at,
            configuration: config.as_ref().clone(),
            scenarios: scenario_breakdown(executions.iter().copied()),
            status_codes: status_distribution(executions.iter().copied()),
            summary,
            thresholds,
            worker_errors: workers
                .iter()
                .flat_map(|w| w.errors.iter().map(move |e| format!("{}: {}", w.worker_id, e)))
                .collect(),
            worker_failures,
        })
    }
}

/// Validate and run a load test with `reqwest` clients
pub async fn run_load_test(
    config: TestConfiguration,
    http: &HttpConfig,
) -> ExecutionResult<TestReport> {
    Coordinator::new(config, http)?.run_load_test().await
}

/// Load a test configuration from a JSON or YAML file and run it
pub async fn run_custom_load_test(
    path: impl AsRef<Path>,
    http: &HttpConfig,
) -> ExecutionResult<TestReport> {
    let path = path.as_ref();
    info!("Loading custom load test from {}", path.display());
    let config = ConfigLoader::new().load_test_file(path)?;
    run_load_test(config, http).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionError;
    use stampede_config::{Scenario, ShutdownMode, ThinkTime};
    use stampede_http::{HttpClient, HttpError, HttpResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Every `/flaky` request fails with 500, everything else succeeds
    struct StubClient {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl HttpClient for StubClient {
        async fn execute(&self, _url: &str, request: &RequestSpec) -> Result<HttpResponse, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(1)).await;
            if request.path == "/flaky" {
                return Err(HttpError::Status { status_code: 500 });
            }
            Ok(HttpResponse {
                status_code: 200,
                body_size: 100,
                elapsed: Duration::from_millis(1),
            })
        }
    }

    struct StubFactory {
        calls: Arc<AtomicUsize>,
    }

    impl ClientFactory for StubFactory {
        fn create(&self) -> Result<Arc<dyn HttpClient>, HttpError> {
            Ok(Arc::new(StubClient {
                calls: Arc::clone(&self.calls),
            }))
        }
    }

    fn config() -> TestConfiguration {
        TestConfiguration {
            base_url: "http://target.test".to_string(),
            concurrency: 4,
            worker_count: 2,
            duration: Duration::from_secs(1),
            ramp_up: Duration::ZERO,
            warmup: false,
            think_time: ThinkTime {
                min: Duration::from_millis(5),
                max: Duration::from_millis(10),
            },
            ..TestConfiguration::default()
        }
    }

    fn coordinator(config: TestConfiguration) -> (Coordinator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(StubFactory {
            calls: Arc::clone(&calls),
        });
        (Coordinator::with_client_factory(config, factory).unwrap(), calls)
    }

    #[test]
    fn test_invalid_config_fails_before_load() {
        let mut config = config();
        config.concurrency = 0;
        let calls = Arc::new(AtomicUsize::new(0));
        let result = Coordinator::with_client_factory(config, Arc::new(StubFactory { calls: calls.clone() }));

        assert!(matches!(result, Err(ExecutionError::ConfigurationError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_aggregates_all_workers() {
        let (coordinator, calls) = coordinator(config());
        let report = coordinator.run_load_test().await.unwrap();
        let summary = &report.summary;

        assert!(summary.total_requests > 0);
        assert_eq!(
            summary.total_requests,
            summary.successful_requests + summary.failed_requests
        );
        assert_eq!(summary.error_rate, 0.0);
        assert_eq!(summary.data_transferred, summary.successful_requests * 100);
        assert!(summary.total_duration >= 1.0);
        assert!(
            (summary.throughput - summary.total_requests as f64 / summary.total_duration).abs()
                < 1e-9
        );
        assert!(report.worker_failures.is_empty());
        assert!(report.ended_at >= report.started_at);
        assert_eq!(report.status_codes.get(&200).copied(), Some(summary.total_requests));
        assert!(calls.load(Ordering::SeqCst) as u64 >= summary.total_requests);
        assert_eq!(report.scenarios.len(), 1);
        assert_eq!(report.scenarios[0].name, "default");
    }

    #[tokio::test]
    async fn test_failed_requests_become_data() {
        let mut config = config();
        config.scenarios = vec![Scenario::new(
            "flaky",
            vec![
                RequestSpec::new(HttpMethod::Get, "/flaky"),
                RequestSpec::new(HttpMethod::Get, "/never-reached"),
            ],
        )];
        config.thresholds.throughput = 0.0;

        let (coordinator, _calls) = coordinator(config);
        let report = coordinator.run_load_test().await.unwrap();

        assert!(report.summary.total_requests > 0);
        assert_eq!(report.summary.successful_requests, 0);
        assert_eq!(report.summary.error_rate, 100.0);
        assert_eq!(report.summary.average_response_time, 0.0);
        assert_eq!(report.status_codes.keys().copied().collect::<Vec<_>>(), vec![500]);
        assert_eq!(report.scenarios[0].failed, report.scenarios[0].executions);
        assert_eq!(report.scenarios[0].requests, report.scenarios[0].executions);

        assert!(!report.passed());
        assert_eq!(report.thresholds.violations.len(), 1);
        assert_eq!(report.thresholds.violations[0].metric, "errorRate");
    }

    #[tokio::test]
    async fn test_warmup_is_untracked() {
        let mut config = config();
        config.warmup = true;
        config.duration = Duration::from_millis(300);

        let (coordinator, calls) = coordinator(config);
        let report = coordinator.run_load_test().await.unwrap();

        let issued = calls.load(Ordering::SeqCst) as u64;
        assert!(issued >= WARMUP_REQUESTS as u64 + report.summary.total_requests);
        assert!(report.status_codes.values().sum::<u64>() == report.summary.total_requests);
    }

    #[tokio::test]
    async fn test_drain_mode_completes() {
        let mut config = config();
        config.shutdown = ShutdownMode::Drain {
            grace: Duration::from_secs(2),
        };
        config.duration = Duration::from_millis(500);

        let (coordinator, _calls) = coordinator(config);
        let report = coordinator.run_load_test().await.unwrap();

        assert!(report.summary.total_requests > 0);
        assert!(report.summary.total_duration < 3.0);
        assert!(report.worker_failures.is_empty());
    }

    #[tokio::test]
    async fn test_run_custom_load_test_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!("stampede-invalid-{}.json", Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"baseURL": "ftp://example.com", "concurrency": 1, "duration": 1}"#,
        )
        .unwrap();

        let result = run_custom_load_test(&path, &HttpConfig::default()).await;
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(ExecutionError::ConfigurationError(_))));
    }
}
