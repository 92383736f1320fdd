//! Configuration loading and environment variable handling

use crate::domains::load_test::TestConfiguration;
use crate::domains::StampedeConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::validation::Validatable;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "STAMPEDE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML or JSON file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<StampedeConfig> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let mut config: StampedeConfig = if is_json(path) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<StampedeConfig> {
        let mut config = StampedeConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<StampedeConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Load a standalone custom test file (JSON matching [`TestConfiguration`])
    ///
    /// Validation runs before returning, so a bad file never produces partial load.
    pub fn load_test_file(&self, path: impl AsRef<Path>) -> ConfigResult<TestConfiguration> {
        let path = path.as_ref();
        debug!("Loading custom test configuration from {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let config: TestConfiguration = if is_json(path) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        self.apply_load_test_overrides(&mut config.load_test)?;
        self.apply_analyzer_overrides(&mut config.analyzer)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_output_overrides(&mut config.output)?;
        Ok(())
    }

    /// Apply load test overrides
    fn apply_load_test_overrides(&self, config: &mut TestConfiguration) -> ConfigResult<()> {
        if let Ok(base_url) = self.get_env_var("BASE_URL") {
            config.base_url = base_url;
        }

        if let Some(concurrency) = self.parse_env_var::<u64>("CONCURRENCY")? {
            config.concurrency = concurrency;
        }

        if let Some(seconds) = self.parse_env_var::<u64>("DURATION")? {
            config.duration = Duration::from_secs(seconds);
        }

        if let Some(seconds) = self.parse_env_var::<u64>("RAMP_UP")? {
            config.ramp_up = Duration::from_secs(seconds);
        }

        if let Some(workers) = self.parse_env_var::<u64>("WORKERS")? {
            config.worker_count = workers;
        }

        if let Some(millis) = self.parse_env_var::<u64>("REQUEST_TIMEOUT_MS")? {
            config.timeout = Duration::from_millis(millis);
        }

        if let Some(warmup) = self.parse_env_var::<bool>("WARMUP")? {
            config.warmup = warmup;
        }

        Ok(())
    }

    /// Apply analyzer overrides
    fn apply_analyzer_overrides(
        &self,
        config: &mut crate::domains::analyzer::AnalyzerConfig,
    ) -> ConfigResult<()> {
        if let Some(millis) = self.parse_env_var::<u64>("SAMPLING_INTERVAL_MS")? {
            config.sampling_interval = Duration::from_millis(millis);
        }

        if let Some(seconds) = self.parse_env_var::<u64>("ANALYSIS_WINDOW")? {
            config.analysis_window = Duration::from_secs(seconds);
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Apply output config overrides
    fn apply_output_overrides(
        &self,
        config: &mut crate::domains::output::OutputConfig,
    ) -> ConfigResult<()> {
        if let Ok(dir) = self.get_env_var("OUTPUT_DIR") {
            config.directory = dir.into();
        }

        Ok(())
    }

    /// Parse an optional prefixed environment variable
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
