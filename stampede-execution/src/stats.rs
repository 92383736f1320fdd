//! Result collection and summary statistics

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, warn};

use crate::ipc::CoordinatorMessage;
use crate::types::{RequestResult, ScenarioExecution, ScenarioStats, TestSummary, WorkerResult};

/// Value at percentile `p` (0-100) of an ascending-sorted slice
///
/// Uses the nearest-rank index `ceil(p / 100 * n) - 1`, clamped to the slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p / 100.0 * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}

/// Requests one virtual user has streamed for the pass it is running
#[derive(Debug)]
struct OpenPass {
    scenario: String,
    results: Vec<RequestResult>,
}

/// Accumulates worker messages during a run
///
/// Request results arrive one by one and are grouped per virtual user until
/// the matching `ScenarioCompleted` closes the pass.
#[derive(Debug, Default)]
pub struct ResultCollector {
    workers: HashMap<String, WorkerResult>,
    order: Vec<String>,
    open: HashMap<(String, u64), OpenPass>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn worker_mut(&mut self, worker_id: &str) -> &mut WorkerResult {
        if !self.workers.contains_key(worker_id) {
            self.order.push(worker_id.to_string());
        }
        self.workers
            .entry(worker_id.to_string())
            .or_insert_with(|| WorkerResult::new(worker_id))
    }

    /// Fold one message into the collected results
    pub fn handle(&mut self, message: CoordinatorMessage) {
        match message {
            CoordinatorMessage::Ready {
                worker_id,
                virtual_users,
            } => {
                debug!("{} ready with {} virtual users", worker_id, virtual_users);
                self.worker_mut(&worker_id).virtual_users = virtual_users;
            }
            CoordinatorMessage::RequestCompleted {
                worker_id,
                user_id,
                scenario,
                result,
            } => {
                self.worker_mut(&worker_id);
                self.open
                    .entry((worker_id, user_id))
                    .or_insert_with(|| OpenPass {
                        scenario,
                        results: Vec::new(),
                    })
                    .results
                    .push(result);
            }
            CoordinatorMessage::ScenarioCompleted {
                worker_id,
                user_id,
                scenario,
                duration,
                success,
                timestamp,
            } => {
                let results = self
                    .open
                    .remove(&(worker_id.clone(), user_id))
                    .map(|pass| pass.results)
                    .unwrap_or_default();
                self.worker_mut(&worker_id).executions.push(ScenarioExecution {
                    scenario,
                    duration,
                    results,
                    success,
                    timestamp,
                    interrupted: false,
                });
            }
            CoordinatorMessage::Error { worker_id, error } => {
                warn!("{} reported an error: {}", worker_id, error);
                self.worker_mut(&worker_id).errors.push(error);
            }
            CoordinatorMessage::Stopped { worker_id } => {
                debug!("{} stopped", worker_id);
            }
        }
    }

    /// Worker results in the order workers first reported
    ///
    /// Passes still open were cut off by a hard stop. Their completed
    /// requests are kept as interrupted executions.
    pub fn into_worker_results(mut self) -> Vec<WorkerResult> {
        let mut open: Vec<_> = std::mem::take(&mut self.open).into_iter().collect();
        open.sort_by(|a, b| a.0.cmp(&b.0));

        for ((worker_id, user_id), pass) in open {
            debug!(
                "Virtual user {} on {} stopped inside {} after {} requests",
                user_id,
                worker_id,
                pass.scenario,
                pass.results.len()
            );
            let timestamp = pass
                .results
                .first()
                .map(|r| r.timestamp)
                .unwrap_or_else(Utc::now);
            self.worker_mut(&worker_id).executions.push(ScenarioExecution {
                scenario: pass.scenario,
                duration: pass.results.iter().map(|r| r.response_time).sum(),
                results: pass.results,
                success: false,
                timestamp,
                interrupted: true,
            });
        }

        self.order
            .iter()
            .filter_map(|id| self.workers.remove(id))
            .collect()
    }
}

/// Summarize executions over `wall_clock` of elapsed run time
pub fn summarize<'a, I>(executions: I, wall_clock: Duration) -> TestSummary
where
    I: IntoIterator<Item = &'a ScenarioExecution>,
{
    let mut total_requests = 0u64;
    let mut successful_requests = 0u64;
    let mut data_transferred = 0u64;
    let mut response_times = Vec::new();

    for result in executions.into_iter().flat_map(|e| e.results.iter()) {
        total_requests += 1;
        if result.success {
            successful_requests += 1;
            response_times.push(result.response_time);
            data_transferred += result.response_size.unwrap_or(0);
        }
    }

    let failed_requests = total_requests - successful_requests;
    let total_duration = wall_clock.as_secs_f64();

    response_times.sort_by(|a, b| a.total_cmp(b));

    let average_response_time = if response_times.is_empty() {
        0.0
    } else {
        response_times.iter().sum::<f64>() / response_times.len() as f64
    };

    TestSummary {
        total_requests,
        successful_requests,
        failed_requests,
        error_rate: if total_requests == 0 {
            0.0
        } else {
            failed_requests as f64 / total_requests as f64 * 100.0
        },
        throughput: if total_duration > 0.0 {
            total_requests as f64 / total_duration
        } else {
            0.0
        },
        average_response_time,
        median_response_time: percentile(&response_times, 50.0),
        p95_response_time: percentile(&response_times, 95.0),
        p99_response_time: percentile(&response_times, 99.0),
        min_response_time: response_times.first().copied().unwrap_or(0.0),
        max_response_time: response_times.last().copied().unwrap_or(0.0),
        total_duration,
        data_transferred,
    }
}

/// Per-scenario breakdown of finished passes, sorted by scenario name
pub fn scenario_breakdown<'a, I>(executions: I) -> Vec<ScenarioStats>
where
    I: IntoIterator<Item = &'a ScenarioExecution>,
{
    let mut by_name: BTreeMap<&str, (ScenarioStats, f64)> = BTreeMap::new();

    for execution in executions.into_iter().filter(|e| !e.interrupted) {
        let (stats, total_duration) = by_name
            .entry(execution.scenario.as_str())
            .or_insert_with(|| {
                (
                    ScenarioStats {
                        name: execution.scenario.clone(),
                        ..Default::default()
                    },
                    0.0,
                )
            });

        stats.executions += 1;
        stats.requests += execution.results.len() as u64;
        if execution.success {
            stats.successful += 1;
        } else {
            stats.failed += 1;
        }
        *total_duration += execution.duration;
    }

    by_name
        .into_values()
        .map(|(mut stats, total_duration)| {
            stats.average_duration = total_duration / stats.executions as f64;
            stats
        })
        .collect()
}

/// Number of requests per status code
pub fn status_distribution<'a, I>(executions: I) -> BTreeMap<u16, u64>
where
    I: IntoIterator<Item = &'a ScenarioExecution>,
{
    let mut distribution = BTreeMap::new();
    for result in executions.into_iter().flat_map(|e| e.results.iter()) {
        *distribution.entry(result.status_code).or_insert(0) += 1;
    }
    distribution
}
