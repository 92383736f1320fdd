//! Error types for load execution

use thiserror::Error;

/// Load execution errors
///
/// Individual request failures are never surfaced here; they are recorded
/// as data in the results. These errors abort a run before or around load.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] stampede_config::ConfigError),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] stampede_http::HttpError),

    #[error("Runtime error: {0}")]
    RuntimeError(#[from] std::io::Error),

    #[error("No worker could be started")]
    NoWorkers,
}

/// Result type for execution operations
pub type ExecutionResult<T> = Result<T, ExecutionError>;
