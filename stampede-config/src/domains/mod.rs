//! Domain-specific configuration modules

pub mod analyzer;
pub mod capacity;
pub mod http;
pub mod logging;
pub mod output;
pub mod profiles;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Stampede configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StampedeConfig {
    /// Load test target, scenarios and thresholds
    #[serde(default)]
    pub load_test: load_test::TestConfiguration,

    /// Bottleneck analyzer configuration
    #[serde(default)]
    pub analyzer: analyzer::AnalyzerConfig,

    /// Capacity projection limits
    #[serde(default)]
    pub capacity: capacity::CapacityConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// Report output configuration
    #[serde(default)]
    pub output: output::OutputConfig,
}

impl StampedeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.load_test.validate()?;
        self.analyzer.validate()?;
        self.capacity.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        self.output.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let mut config = Self::default();
        config.load_test.scenarios = vec![
            load_test::Scenario::new(
                "browse",
                vec![
                    load_test::RequestSpec::new(load_test::HttpMethod::Get, "/api/health")
                        .with_name("health"),
                    load_test::RequestSpec::new(load_test::HttpMethod::Get, "/api/items")
                        .with_name("list_items"),
                ],
            )
            .with_weight(3.0),
            load_test::Scenario::new(
                "checkout",
                vec![load_test::RequestSpec::new(load_test::HttpMethod::Post, "/api/orders")
                    .with_name("create_order")
                    .with_header("content-type", "application/json")
                    .with_body(serde_json::json!({ "item": 1, "quantity": 2 }))],
            ),
        ];
        serde_yaml::to_string(&config).unwrap_or_else(|_| "# Failed to generate sample".to_string())
    }
}
