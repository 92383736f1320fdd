//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use stampede_config::{LoadProfile, StampedeConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML or JSON)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Directory receiving JSON reports
    #[arg(long, value_name = "PATH", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Base URL of the service under test
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load test with bottleneck monitoring and capacity projection
    Full,

    /// Run a load test, optionally shaped by a named profile
    Load {
        /// Load profile
        #[arg(value_enum)]
        profile: Option<LoadProfile>,
    },

    /// Monitor this host for bottlenecks
    Bottleneck {
        /// Seconds to monitor (defaults to one analysis window)
        #[arg(long, value_name = "SECONDS")]
        duration: Option<u64>,
    },

    /// Project when resource limits will be reached
    Capacity {
        /// JSON array of historical data points; sampled live when omitted
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,

        /// Seconds to sample when no history is given
        #[arg(long, value_name = "SECONDS", default_value = "30")]
        duration: u64,
    },

    /// Run a load test described by a JSON or YAML file
    Custom {
        /// Path to the test configuration
        #[arg(value_name = "CONFIG_FILE")]
        config_file: PathBuf,
    },

    /// Print a sample configuration file
    Sample,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut StampedeConfig) {
        if let Some(base_url) = &self.base_url {
            config.load_test.base_url = base_url.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output.directory = output_dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_load_with_profile_and_globals() {
        let cli = Cli::parse_from([
            "stampede",
            "load",
            "heavy",
            "--base-url",
            "http://localhost:9000",
            "--output-dir",
            "out",
        ]);

        assert!(matches!(
            cli.command,
            Some(Commands::Load {
                profile: Some(LoadProfile::Heavy)
            })
        ));

        let mut config = StampedeConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.load_test.base_url, "http://localhost:9000");
        assert_eq!(config.output.directory, PathBuf::from("out"));
    }

    #[test]
    fn test_parse_custom_and_capacity() {
        let cli = Cli::parse_from(["stampede", "custom", "tests/peak.json"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Custom { ref config_file }) if config_file == &PathBuf::from("tests/peak.json")
        ));

        let cli = Cli::parse_from(["stampede", "--log-level", "debug", "capacity", "--history", "h.json"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(
            cli.command,
            Some(Commands::Capacity { history: Some(_), duration: 30 })
        ));
    }

    #[test]
    fn test_unknown_profile_rejected() {
        assert!(Cli::try_parse_from(["stampede", "load", "extreme"]).is_err());
    }
}
