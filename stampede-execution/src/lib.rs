//! Stampede Execution Engine
//!
//! This crate drives synthetic load against a target HTTP service: a
//! [`Coordinator`] spawns a pool of worker threads, each hosting a set of
//! virtual users on its own single-threaded runtime, collects their scenario
//! results over a channel and aggregates them into a [`TestReport`].

pub mod coordinator;
pub mod error;
pub mod ipc;
pub mod stats;
pub mod thresholds;
pub mod types;
pub mod virtual_user;
pub mod worker;

// Re-export main types
pub use coordinator::{run_custom_load_test, run_load_test, Coordinator, WARMUP_PATH, WARMUP_REQUESTS};
pub use error::{ExecutionError, ExecutionResult};
pub use ipc::{CoordinatorMessage, WorkerMessage};
pub use stats::{percentile, scenario_breakdown, status_distribution, summarize, ResultCollector};
pub use thresholds::check_thresholds;
pub use types::{
    RequestResult, ScenarioExecution, ScenarioStats, TestReport, TestSummary, ThresholdCheck,
    ThresholdViolation, ViolationSeverity, WorkerFailure, WorkerResult,
};
pub use virtual_user::{pick_scenario, VirtualUser};
pub use worker::{ClientFactory, HttpClientFactory, WorkerPool};
