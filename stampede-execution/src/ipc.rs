//! Messages exchanged between the coordinator and its workers
//!
//! Workers run on their own threads and only ever talk to the coordinator
//! through these messages: control flows down a watch channel carrying
//! [`WorkerMessage`], results flow up an unbounded channel carrying
//! [`CoordinatorMessage`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RequestResult;

/// Control state sent from the coordinator to every worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    /// Keep generating load
    #[default]
    Run,
    /// Finish the current scenario and stop
    Drain,
    /// Stop immediately, dropping anything in flight
    Shutdown,
}

impl WorkerMessage {
    pub fn is_stopping(&self) -> bool {
        !matches!(self, WorkerMessage::Run)
    }
}

/// Messages sent from workers to the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorMessage {
    /// Worker runtime is up and its virtual users are scheduled
    Ready {
        worker_id: String,
        virtual_users: u64,
    },

    /// A virtual user finished one request of its current scenario pass
    ///
    /// Sent as soon as the request completes, so a hard stop only loses the
    /// request that was still in flight.
    RequestCompleted {
        worker_id: String,
        user_id: u64,
        scenario: String,
        result: RequestResult,
    },

    /// A virtual user finished one scenario pass
    ///
    /// Closes the requests streamed by the same user since its previous pass.
    ScenarioCompleted {
        worker_id: String,
        user_id: u64,
        scenario: String,
        /// Milliseconds spent executing the scenario
        duration: f64,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    /// Worker-level error; the worker may or may not keep running
    Error { worker_id: String, error: String },

    /// Worker has stopped all of its virtual users
    Stopped { worker_id: String },
}
