//! Report error types

use thiserror::Error;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid report kind '{0}'")]
    InvalidKind(String),
}
