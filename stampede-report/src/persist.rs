//! Timestamped JSON report files

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use stampede_config::OutputConfig;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{ReportError, ReportResult};

/// `{kind}_{timestamp}.json`, with `-` in place of `:` so the name is portable
pub fn report_file_name(kind: &str, at: DateTime<Utc>) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "-");
    format!("{}_{}.json", kind, timestamp)
}

/// Writes reports into one output directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    directory: PathBuf,
    pretty: bool,
}

impl ReportWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            pretty: true,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            pretty: config.pretty,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Serialize `value` into a new file, creating the directory if needed
    pub async fn write<T: Serialize>(&self, kind: &str, value: &T) -> ReportResult<PathBuf> {
        if kind.is_empty() || kind.contains(['/', '\\', '\0']) {
            return Err(ReportError::InvalidKind(kind.to_string()));
        }

        fs::create_dir_all(&self.directory).await?;

        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };

        let path = self.directory.join(report_file_name(kind, Utc::now()));
        fs::write(&path, &bytes).await?;

        info!("Wrote {} report to {}", kind, path.display());
        Ok(path)
    }
}

/// Write a pretty-printed report into `dir`
pub async fn write_report<T: Serialize>(
    dir: impl AsRef<Path>,
    kind: &str,
    value: &T,
) -> ReportResult<PathBuf> {
    ReportWriter::new(dir.as_ref()).write(kind, value).await
}

/// Parse a report or any other JSON document back
pub async fn read_report<T: DeserializeOwned>(path: impl AsRef<Path>) -> ReportResult<T> {
    let path = path.as_ref();
    debug!("Reading report from {}", path.display());
    let content = fs::read(path).await?;
    Ok(serde_json::from_slice(&content)?)
}
