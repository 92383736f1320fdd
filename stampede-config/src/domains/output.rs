//! Report output configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and how JSON reports are written
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `<type>_<timestamp>.json` reports
    pub directory: PathBuf,

    /// Pretty-print JSON reports
    #[serde(default = "crate::domains::utils::default_true")]
    pub pretty: bool,

    /// Print a colored summary to stdout after each run
    #[serde(default = "crate::domains::utils::default_true")]
    pub print_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("reports"),
            pretty: true,
            print_summary: true,
        }
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(
            &self.directory.to_string_lossy(),
            "directory",
            self.domain_name(),
        )
    }

    fn domain_name(&self) -> &'static str {
        "output"
    }
}
