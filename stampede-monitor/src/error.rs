//! Monitor error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Monitoring is already running")]
    AlreadyRunning,

    #[error("Monitoring is not running")]
    NotRunning,

    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] stampede_config::ConfigError),

    #[error("Monitor task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

pub type MonitorResult<T> = Result<T, MonitorError>;
