//! System and runtime metric sampling

use chrono::Utc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use std::time::Duration;
use tracing::trace;

use crate::types::MetricSample;

/// Tasks currently alive on the ambient tokio runtime, 0 outside a runtime
pub fn runtime_active_tasks() -> u64 {
    tokio::runtime::Handle::try_current()
        .map(|handle| handle.metrics().num_alive_tasks() as u64)
        .unwrap_or(0)
}

/// CPU estimate from the one-minute load average, for when usage is unavailable
fn load_average_estimate() -> f64 {
    let load = System::load_average();
    let cpus = num_cpus::get().max(1) as f64;
    (load.one / cpus * 100.0).clamp(0.0, 100.0)
}

/// Captures [`MetricSample`]s of the host and this process
///
/// Sampling never fails: metrics that cannot be read fall back to an
/// estimate or to zero.
pub struct MetricsSampler {
    system: System,
    pid: Option<Pid>,
    cpu_primed: bool,
}

impl MetricsSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();

        Self {
            system,
            pid: sysinfo::get_current_pid().ok(),
            cpu_primed: false,
        }
    }

    /// Take a sample, combining host readings with runtime measurements
    pub fn sample(&mut self, event_loop_lag: Duration, active_handles: u64) -> MetricSample {
        self.system.refresh_memory();

        let sample = MetricSample {
            timestamp: Utc::now(),
            cpu_usage: self.cpu_usage(),
            memory_usage: self.memory_usage(),
            heap_usage: self.heap_usage(),
            event_loop_lag: event_loop_lag.as_nanos() as f64 / 1_000_000.0,
            active_handles,
        };

        trace!(
            "Sampled cpu={:.1}% memory={:.1}% heap={:.1}% lag={:.2}ms handles={}",
            sample.cpu_usage,
            sample.memory_usage,
            sample.heap_usage,
            sample.event_loop_lag,
            sample.active_handles
        );
        sample
    }

    /// Global CPU usage; usage needs two refreshes, so the first reading uses the load average
    fn cpu_usage(&mut self) -> f64 {
        self.system.refresh_cpu_usage();
        let usage = self.system.global_cpu_usage() as f64;

        if !self.cpu_primed || self.system.cpus().is_empty() || !usage.is_finite() {
            self.cpu_primed = true;
            return load_average_estimate();
        }
        usage.clamp(0.0, 100.0)
    }

    fn memory_usage(&self) -> f64 {
        let total = self.system.total_memory();
        if total == 0 {
            return 0.0;
        }
        (self.system.used_memory() as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Resident memory of this process as a share of system memory
    fn heap_usage(&mut self) -> f64 {
        let (Some(pid), total) = (self.pid, self.system.total_memory()) else {
            return 0.0;
        };
        if total == 0 {
            return 0.0;
        }

        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        self.system
            .process(pid)
            .map(|process| (process.memory() as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
            .unwrap_or(0.0)
    }
}

impl Default for MetricsSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_values_are_percentages() {
        let mut sampler = MetricsSampler::new();
        for _ in 0..2 {
            let sample = sampler.sample(Duration::from_micros(2500), 7);
            for value in [sample.cpu_usage, sample.memory_usage, sample.heap_usage] {
                assert!((0.0..=100.0).contains(&value), "out of range: {}", value);
            }
            assert_eq!(sample.event_loop_lag, 2.5);
            assert_eq!(sample.active_handles, 7);
        }
    }

    #[test]
    fn test_active_tasks_outside_runtime() {
        assert_eq!(runtime_active_tasks(), 0);
    }

    #[tokio::test]
    async fn test_active_tasks_counts_spawned() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _ = rx.await;
        });

        assert!(runtime_active_tasks() >= 1);

        tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
