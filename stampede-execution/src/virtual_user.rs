//! Virtual users: the unit of simulated traffic

use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};
use stampede_config::{RequestSpec, Scenario, TestConfiguration};
use stampede_http::HttpClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::ipc::{CoordinatorMessage, WorkerMessage};
use crate::types::{RequestResult, ScenarioExecution};

/// Pick a scenario by weight
///
/// `roll` is a uniform sample in `[0, 1)`. The target `total_weight * roll`
/// is reduced by each weight in turn and the first scenario that brings it
/// to zero or below wins; rounding leftovers fall through to the last one.
pub fn pick_scenario(scenarios: &[Scenario], roll: f64) -> Option<&Scenario> {
    let total_weight: f64 = scenarios.iter().map(|s| s.weight).sum();
    let mut remaining = total_weight * roll;

    for scenario in scenarios {
        remaining -= scenario.weight;
        if remaining <= 0.0 {
            return Some(scenario);
        }
    }

    scenarios.last()
}

fn millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// One simulated user looping over weighted scenarios until stopped
pub struct VirtualUser {
    id: u64,
    worker_id: String,
    config: Arc<TestConfiguration>,
    scenarios: Arc<Vec<Scenario>>,
    client: Arc<dyn HttpClient>,
    results: mpsc::UnboundedSender<CoordinatorMessage>,
    control: watch::Receiver<WorkerMessage>,
    rng: StdRng,
}

impl VirtualUser {
    pub fn new(
        id: u64,
        worker_id: impl Into<String>,
        config: Arc<TestConfiguration>,
        scenarios: Arc<Vec<Scenario>>,
        client: Arc<dyn HttpClient>,
        results: mpsc::UnboundedSender<CoordinatorMessage>,
        control: watch::Receiver<WorkerMessage>,
    ) -> Self {
        Self {
            id,
            worker_id: worker_id.into(),
            config,
            scenarios,
            client,
            results,
            control,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replace the random source, for reproducible scenario selection
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    fn stopping(&self) -> bool {
        self.control.borrow().is_stopping()
    }

    /// Sleep for `duration` unless a stop arrives first; returns false when stopping
    async fn pause(&mut self, duration: Duration) -> bool {
        if duration.is_zero() {
            tokio::task::yield_now().await;
            return !self.stopping();
        }

        let interrupted = tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = self.control.wait_for(|m| m.is_stopping()) => true,
        };
        !interrupted && !self.stopping()
    }

    fn think_time(&mut self) -> Duration {
        let min = self.config.think_time.min.as_millis() as u64;
        let max = self.config.think_time.max.as_millis() as u64;
        if min >= max {
            return Duration::from_millis(min);
        }
        Duration::from_millis(self.rng.random_range(min..=max))
    }

    /// Run scenarios until the worker is told to stop
    ///
    /// Start is delayed by this user's ramp-up offset. A stop is honoured
    /// between scenarios, so in drain mode the current pass always completes.
    pub async fn run(mut self) {
        let offset = self.config.ramp_up_offset(self.id);
        debug!(
            "Virtual user {} on {} starting after {}ms",
            self.id,
            self.worker_id,
            offset.as_millis()
        );

        if !offset.is_zero() && !self.pause(offset).await {
            return;
        }

        let scenarios = Arc::clone(&self.scenarios);
        loop {
            if self.stopping() {
                break;
            }

            let roll = self.rng.random::<f64>();
            let Some(scenario) = pick_scenario(&scenarios, roll) else {
                break;
            };

            let execution = self.execute_scenario(scenario).await;
            let message = CoordinatorMessage::ScenarioCompleted {
                worker_id: self.worker_id.clone(),
                user_id: self.id,
                scenario: execution.scenario,
                duration: execution.duration,
                success: execution.success,
                timestamp: execution.timestamp,
            };
            if self.results.send(message).is_err() {
                // Coordinator is gone
                break;
            }

            let think = self.think_time();
            if !self.pause(think).await {
                break;
            }
        }

        debug!("Virtual user {} on {} stopped", self.id, self.worker_id);
    }

    /// Run a scenario's requests in order, stopping at the first failure
    ///
    /// Every result is streamed to the coordinator as soon as it completes.
    pub async fn execute_scenario(&self, scenario: &Scenario) -> ScenarioExecution {
        let timestamp = Utc::now();
        let started = Instant::now();
        let mut results = Vec::with_capacity(scenario.requests.len());
        let mut success = true;

        for request in &scenario.requests {
            let result = self.execute_request(request).await;
            let failed = !result.success;
            // A closed channel is noticed by `run` once the pass completes
            let _ = self.results.send(CoordinatorMessage::RequestCompleted {
                worker_id: self.worker_id.clone(),
                user_id: self.id,
                scenario: scenario.name.clone(),
                result: result.clone(),
            });
            results.push(result);
            if failed {
                success = false;
                break;
            }
        }

        ScenarioExecution {
            scenario: scenario.name.clone(),
            duration: millis(started.elapsed()),
            results,
            success,
            timestamp,
            interrupted: false,
        }
    }

    /// Execute one request; failures are captured in the result, never returned
    pub async fn execute_request(&self, request: &RequestSpec) -> RequestResult {
        let url = self.config.url_for(&request.path);
        let timestamp = Utc::now();
        let started = Instant::now();

        match self.client.execute(&url, request).await {
            Ok(response) => RequestResult {
                name: request.display_name(),
                method: request.method,
                path: request.path.clone(),
                status_code: response.status_code,
                response_time: millis(response.elapsed),
                response_size: Some(response.body_size),
                error: None,
                timestamp,
                success: true,
            },
            Err(e) => {
                trace!("{} {} failed: {}", request.method, url, e);
                RequestResult {
                    name: request.display_name(),
                    method: request.method,
                    path: request.path.clone(),
                    status_code: e.status_code(),
                    response_time: millis(started.elapsed()),
                    response_size: None,
                    error: Some(e.to_string()),
                    timestamp,
                    success: false,
                }
            }
        }
    }
}
