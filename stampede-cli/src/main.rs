use anyhow::{Context, Result};
use clap::Parser;
use stampede_config::{ConfigLoader, LoadProfile, StampedeConfig};
use stampede_execution::{run_custom_load_test, run_load_test};
use stampede_logging::init_logging_from_config;
use stampede_monitor::BottleneckMonitor;
use stampede_report::{
    read_report, CapacityDataPoint, CapacityPlanner, LinearTrendPlanner, ReportAggregator,
    ReportWriter,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

mod cli;
mod summary;

use cli::{Cli, Commands};

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&PathBuf>) -> Result<StampedeConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                loader
                    .from_file(path)
                    .with_context(|| format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

async fn handle_load(config: &StampedeConfig, profile: Option<LoadProfile>) -> Result<PathBuf> {
    let test = match profile {
        Some(profile) => {
            info!("Applying {} load profile", profile);
            profile.apply(&config.load_test)
        }
        None => config.load_test.clone(),
    };

    let report = run_load_test(test, &config.http)
        .await
        .context("Load test failed")?;

    if config.output.print_summary {
        summary::print_load_summary(&report);
    }
    Ok(ReportWriter::from_config(&config.output)
        .write("load", &report)
        .await?)
}

async fn handle_custom(config: &StampedeConfig, config_file: &Path) -> Result<PathBuf> {
    let report = run_custom_load_test(config_file, &config.http)
        .await
        .with_context(|| format!("Custom load test from {:?} failed", config_file))?;

    if config.output.print_summary {
        summary::print_load_summary(&report);
    }
    Ok(ReportWriter::from_config(&config.output)
        .write("custom", &report)
        .await?)
}

async fn handle_bottleneck(config: &StampedeConfig, duration: Option<u64>) -> Result<PathBuf> {
    let duration = duration
        .map(Duration::from_secs)
        .unwrap_or(config.analyzer.analysis_window);
    info!("Monitoring for bottlenecks for {}s", duration.as_secs());

    let monitor =
        BottleneckMonitor::new(config.analyzer.clone()).context("Invalid analyzer configuration")?;
    let report = monitor.run_for(duration).await?;

    if config.output.print_summary {
        summary::print_bottleneck_summary(&report);
    }
    Ok(ReportWriter::from_config(&config.output)
        .write("bottleneck", &report)
        .await?)
}

/// Sample this host for `duration` and turn the samples into capacity data points
async fn sample_capacity_points(
    config: &StampedeConfig,
    duration: Duration,
) -> Result<Vec<CapacityDataPoint>> {
    info!("Sampling resource usage for {}s", duration.as_secs());
    let monitor =
        BottleneckMonitor::new(config.analyzer.clone()).context("Invalid analyzer configuration")?;
    monitor.run_for(duration).await?;

    Ok(monitor
        .analyzer()
        .samples()
        .iter()
        .map(|sample| CapacityDataPoint::from_sample(sample, 0.0))
        .collect())
}

async fn handle_capacity(
    config: &StampedeConfig,
    history: Option<&PathBuf>,
    duration: u64,
) -> Result<PathBuf> {
    let points: Vec<CapacityDataPoint> = match history {
        Some(path) => read_report(path)
            .await
            .with_context(|| format!("Failed to read capacity history from {:?}", path))?,
        None => sample_capacity_points(config, Duration::from_secs(duration)).await?,
    };

    let projection = LinearTrendPlanner::new(config.capacity).project(&points);

    if config.output.print_summary {
        summary::print_capacity_summary(&projection);
    }
    Ok(ReportWriter::from_config(&config.output)
        .write("capacity", &projection)
        .await?)
}

async fn handle_full(config: &StampedeConfig) -> Result<PathBuf> {
    let monitor =
        BottleneckMonitor::new(config.analyzer.clone()).context("Invalid analyzer configuration")?;
    monitor.start()?;

    let load = run_load_test(config.load_test.clone(), &config.http).await;
    let bottlenecks = monitor.stop().await?;
    let load = load.context("Load test failed")?;

    let points: Vec<CapacityDataPoint> = monitor
        .analyzer()
        .samples()
        .iter()
        .map(|sample| CapacityDataPoint::from_sample(sample, load.summary.average_response_time))
        .collect();
    let projection = LinearTrendPlanner::new(config.capacity).project(&points);

    let report = ReportAggregator::new().aggregate(Some(&load), Some(&bottlenecks), Some(&projection));

    if config.output.print_summary {
        summary::print_full_summary(&report);
    }
    Ok(ReportWriter::from_config(&config.output)
        .write("full", &report)
        .await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Sample)) {
        print!("{}", StampedeConfig::generate_sample());
        return Ok(());
    }

    let mut config = load_config(cli.config.as_ref())?;
    cli.apply_overrides(&mut config);

    let _logging = init_logging_from_config(&config.logging, cli.log_level.as_deref())?;
    info!("Stampede starting");

    let saved = match &cli.command {
        Some(Commands::Full) => handle_full(&config).await?,
        Some(Commands::Load { profile }) => handle_load(&config, *profile).await?,
        Some(Commands::Bottleneck { duration }) => handle_bottleneck(&config, *duration).await?,
        Some(Commands::Capacity { history, duration }) => {
            handle_capacity(&config, history.as_ref(), *duration).await?
        }
        Some(Commands::Custom { config_file }) => handle_custom(&config, config_file).await?,
        Some(Commands::Sample) => return Ok(()),
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            return Ok(());
        }
    };

    summary::print_saved(&saved);
    Ok(())
}
