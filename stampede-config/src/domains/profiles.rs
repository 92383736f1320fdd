//! Named load profiles for `stampede load [profile]`

use crate::domains::load_test::{TestConfiguration, TestThresholds};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Predefined load shapes, from a gentle smoke run to a sudden spike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LoadProfile {
    #[default]
    Light,
    Medium,
    Heavy,
    Stress,
    Spike,
}

struct ProfileShape {
    concurrency: u64,
    duration_secs: u64,
    ramp_up_secs: u64,
    thresholds: TestThresholds,
}

impl LoadProfile {
    pub fn all() -> &'static [LoadProfile] {
        &[
            LoadProfile::Light,
            LoadProfile::Medium,
            LoadProfile::Heavy,
            LoadProfile::Stress,
            LoadProfile::Spike,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadProfile::Light => "light",
            LoadProfile::Medium => "medium",
            LoadProfile::Heavy => "heavy",
            LoadProfile::Stress => "stress",
            LoadProfile::Spike => "spike",
        }
    }

    fn shape(&self) -> ProfileShape {
        match self {
            LoadProfile::Light => ProfileShape {
                concurrency: 10,
                duration_secs: 60,
                ramp_up_secs: 10,
                thresholds: TestThresholds {
                    response_time: 500.0,
                    error_rate: 1.0,
                    throughput: 2.0,
                },
            },
            LoadProfile::Medium => ProfileShape {
                concurrency: 50,
                duration_secs: 120,
                ramp_up_secs: 20,
                thresholds: TestThresholds {
                    response_time: 1000.0,
                    error_rate: 2.0,
                    throughput: 10.0,
                },
            },
            LoadProfile::Heavy => ProfileShape {
                concurrency: 200,
                duration_secs: 300,
                ramp_up_secs: 60,
                thresholds: TestThresholds {
                    response_time: 2000.0,
                    error_rate: 5.0,
                    throughput: 40.0,
                },
            },
            LoadProfile::Stress => ProfileShape {
                concurrency: 500,
                duration_secs: 300,
                ramp_up_secs: 60,
                thresholds: TestThresholds {
                    response_time: 3000.0,
                    error_rate: 10.0,
                    throughput: 100.0,
                },
            },
            LoadProfile::Spike => ProfileShape {
                concurrency: 1000,
                duration_secs: 60,
                ramp_up_secs: 5,
                thresholds: TestThresholds {
                    response_time: 5000.0,
                    error_rate: 15.0,
                    throughput: 100.0,
                },
            },
        }
    }

    /// Overlay this profile's load shape and thresholds on `base`, keeping its target and scenarios
    pub fn apply(&self, base: &TestConfiguration) -> TestConfiguration {
        let shape = self.shape();
        TestConfiguration {
            concurrency: shape.concurrency,
            duration: Duration::from_secs(shape.duration_secs),
            ramp_up: Duration::from_secs(shape.ramp_up_secs),
            thresholds: shape.thresholds,
            ..base.clone()
        }
    }
}

impl fmt::Display for LoadProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoadProfile::all()
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownProfile(s.to_string()))
    }
}
