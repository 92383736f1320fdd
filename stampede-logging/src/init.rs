use anyhow::{Context, Result};
use stampede_config::{LogFormat, LogTarget, LoggingConfig};
use std::fs;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Keeps file writers flushing; drop it only when the process is done logging
#[must_use = "dropping the guard stops file logging"]
#[derive(Default)]
pub struct LoggingGuard {
    _file_guards: Vec<WorkerGuard>,
}

/// Filter for `level`, falling back to `RUST_LOG` and then to `info`
pub fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: &str) -> Result<()> {
    // Use try_init to avoid panic if global subscriber already set
    if tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(log_level))
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

fn fmt_layer<S, W>(config: &LoggingConfig, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_thread_names(config.include_thread_names)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    match config.format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Text => layer.boxed(),
    }
}

/// Initialize logging from configuration
///
/// `level_override` (from the command line) wins over the configured level.
pub fn init_logging_from_config(
    config: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<LoggingGuard> {
    let level = level_override.unwrap_or_else(|| config.level.as_str());
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let mut guards = Vec::new();

    for target in &config.targets {
        match target {
            LogTarget::Console => layers.push(fmt_layer(config, std::io::stderr, true)),
            LogTarget::File {
                directory,
                file_name,
            } => {
                fs::create_dir_all(directory)
                    .with_context(|| format!("Failed to create log directory {}", directory))?;
                let appender = tracing_appender::rolling::never(directory, file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                guards.push(guard);
                layers.push(fmt_layer(config, writer, false));
            }
        }
    }

    if layers.is_empty() {
        init_simple_tracing(level)?;
        return Ok(LoggingGuard::default());
    }

    if tracing_subscriber::registry()
        .with(layers)
        .with(build_env_filter(level))
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(LoggingGuard {
        _file_guards: guards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampede_config::LogLevel;

    #[test]
    fn test_filter_accepts_directives() {
        let filter = build_env_filter("stampede_execution=debug,warn");
        assert!(filter.to_string().contains("stampede_execution=debug"));
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        init_simple_tracing("debug").unwrap();
        init_simple_tracing("info").unwrap();
        let _guard = init_logging_from_config(&LoggingConfig::default(), Some("warn")).unwrap();
    }

    #[test]
    fn test_file_target_creates_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let directory = temp.path().join("logs");
        let config = LoggingConfig {
            level: LogLevel::Debug,
            format: LogFormat::Json,
            targets: vec![LogTarget::File {
                directory: directory.to_string_lossy().to_string(),
                file_name: "stampede.log".to_string(),
            }],
            include_location: true,
            include_thread_names: true,
        };

        let _guard = init_logging_from_config(&config, None).unwrap();
        assert!(directory.is_dir());
    }

    #[test]
    fn test_no_targets_falls_back_to_console() {
        let config = LoggingConfig {
            targets: Vec::new(),
            ..LoggingConfig::default()
        };
        let _guard = init_logging_from_config(&config, None).unwrap();
    }
}
