//! Domain-driven configuration management for Stampede
//!
//! This crate provides modular configuration split by functional domains
//! (load test, bottleneck analyzer, HTTP client, logging, output, capacity),
//! with validation, defaults, named load profiles and environment variable
//! support.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    analyzer::{AnalyzerConfig, AnalyzerThresholds},
    capacity::CapacityConfig,
    http::HttpConfig,
    load_test::{
        HttpMethod, HttpMethodError, RequestSpec, Scenario, ShutdownMode, TestConfiguration,
        TestThresholds, ThinkTime,
    },
    logging::{LogFormat, LogLevel, LogTarget, LoggingConfig},
    output::OutputConfig,
    profiles::LoadProfile,
    StampedeConfig,
};

// Re-export utilities
pub use domains::utils::{serde_duration, serde_duration_millis};
