//! Capacity projection limits

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};

/// Limits a projected trend is compared against, and how far ahead to look
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CapacityConfig {
    pub cpu_limit: f64,
    pub memory_limit: f64,
    pub response_time_limit: f64,
    /// Limits reached within this many hours are flagged
    pub horizon_hours: f64,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            cpu_limit: 80.0,
            memory_limit: 85.0,
            response_time_limit: 1000.0,
            horizon_hours: 24.0 * 30.0,
        }
    }
}

impl Validatable for CapacityConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.cpu_limit, "cpuLimit", self.domain_name())?;
        validate_positive(self.memory_limit, "memoryLimit", self.domain_name())?;
        validate_positive(self.response_time_limit, "responseTimeLimit", self.domain_name())?;
        validate_positive(self.horizon_hours, "horizonHours", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "capacity"
    }
}
