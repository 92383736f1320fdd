//! Periodic collection and analysis loops around the analyzer

use chrono::Utc;
use parking_lot::Mutex;
use stampede_config::AnalyzerConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::analyzer::BottleneckAnalyzer;
use crate::error::{MonitorError, MonitorResult};
use crate::events::{EventBroadcaster, MonitorEvent};
use crate::feed::{CacheMetric, DatabaseMetric, RequestMetric};
use crate::report::BottleneckReport;
use crate::sampler::{runtime_active_tasks, MetricsSampler};

struct RunningLoops {
    shutdown: broadcast::Sender<()>,
    collection: JoinHandle<()>,
    analysis: JoinHandle<()>,
}

/// Runs the analyzer continuously
///
/// Once started, a collection loop records one [`MetricsSampler`] sample per
/// sampling interval and an analysis loop runs one analysis pass per
/// interval. The scheduler lag of the collection loop itself is what gets
/// reported as event-loop lag.
pub struct BottleneckMonitor {
    analyzer: Arc<BottleneckAnalyzer>,
    loops: Mutex<Option<RunningLoops>>,
}

impl BottleneckMonitor {
    pub fn new(config: AnalyzerConfig) -> MonitorResult<Self> {
        Ok(Self {
            analyzer: Arc::new(BottleneckAnalyzer::new(config)?),
            loops: Mutex::new(None),
        })
    }

    pub fn analyzer(&self) -> &Arc<BottleneckAnalyzer> {
        &self.analyzer
    }

    pub fn events(&self) -> &EventBroadcaster {
        self.analyzer.events()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.analyzer.events().subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.loops.lock().is_some()
    }

    /// Start both loops on the current runtime
    pub fn start(&self) -> MonitorResult<()> {
        let mut loops = self.loops.lock();
        if loops.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        let interval = self.analyzer.config().sampling_interval;
        let (shutdown, _) = broadcast::channel(1);

        let collection = tokio::spawn(collection_loop(
            Arc::clone(&self.analyzer),
            interval,
            shutdown.subscribe(),
        ));
        let analysis = tokio::spawn(analysis_loop(
            Arc::clone(&self.analyzer),
            interval,
            shutdown.subscribe(),
        ));

        *loops = Some(RunningLoops {
            shutdown,
            collection,
            analysis,
        });

        info!(
            "Bottleneck monitoring started (interval {}ms, window {}s)",
            interval.as_millis(),
            self.analyzer.config().analysis_window.as_secs()
        );
        self.events().broadcast(MonitorEvent::MonitoringStarted {
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Stop both loops and return a final report
    pub async fn stop(&self) -> MonitorResult<BottleneckReport> {
        let RunningLoops {
            shutdown,
            collection,
            analysis,
        } = self.loops.lock().take().ok_or(MonitorError::NotRunning)?;

        let _ = shutdown.send(());
        collection.await?;
        analysis.await?;

        let now = Utc::now();
        info!("Bottleneck monitoring stopped");
        self.events()
            .broadcast(MonitorEvent::MonitoringStopped { timestamp: now });
        Ok(self.analyzer.report(now))
    }

    /// Monitor for `duration`, then stop and report
    pub async fn run_for(&self, duration: Duration) -> MonitorResult<BottleneckReport> {
        self.start()?;
        tokio::time::sleep(duration).await;
        self.stop().await
    }

    pub fn report(&self) -> BottleneckReport {
        self.analyzer.report(Utc::now())
    }

    pub fn add_request_metric(&self, metric: RequestMetric) {
        self.analyzer.add_request_metric(metric);
    }

    pub fn add_database_metric(&self, metric: DatabaseMetric) {
        self.analyzer.add_database_metric(metric);
    }

    pub fn add_cache_metric(&self, metric: CacheMetric) {
        self.analyzer.add_cache_metric(metric);
    }
}

impl Drop for BottleneckMonitor {
    fn drop(&mut self) {
        if let Some(loops) = self.loops.get_mut().take() {
            loops.collection.abort();
            loops.analysis.abort();
        }
    }
}

async fn collection_loop(
    analyzer: Arc<BottleneckAnalyzer>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut sampler = MetricsSampler::new();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            scheduled = ticker.tick() => {
                // How late the runtime woke us up
                let lag = Instant::now().saturating_duration_since(scheduled);
                let sample = sampler.sample(lag, runtime_active_tasks());
                analyzer.record_sample(sample);
            }
            _ = shutdown.recv() => break,
        }
    }
    debug!("Metric collection loop stopped");
}

async fn analysis_loop(
    analyzer: Arc<BottleneckAnalyzer>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately, before any sample exists
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                analyzer.analyze(Utc::now());
            }
            _ = shutdown.recv() => break,
        }
    }
    debug!("Analysis loop stopped");
}
