//! Worker pool: one OS thread per worker, each with its own runtime

use stampede_config::{Scenario, ShutdownMode, TestConfiguration};
use stampede_http::{ClientSettings, HttpClient, HttpError, HttpManager};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::error::{ExecutionError, ExecutionResult};
use crate::ipc::{CoordinatorMessage, WorkerMessage};
use crate::types::WorkerFailure;
use crate::virtual_user::VirtualUser;

/// Builds the HTTP client a worker's virtual users share
///
/// Called once per worker, on the worker's own thread, so every worker gets
/// a connection pool bound to its own runtime.
pub trait ClientFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn HttpClient>, HttpError>;
}

/// Factory producing `reqwest`-backed clients
#[derive(Debug, Clone, Default)]
pub struct HttpClientFactory {
    settings: ClientSettings,
}

impl HttpClientFactory {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self) -> Result<Arc<dyn HttpClient>, HttpError> {
        Ok(Arc::new(HttpManager::new(self.settings.clone())?))
    }
}

/// Everything a worker thread needs to run its virtual users
struct WorkerContext {
    worker_id: String,
    virtual_users: u64,
    config: Arc<TestConfiguration>,
    scenarios: Arc<Vec<Scenario>>,
    client_factory: Arc<dyn ClientFactory>,
    results: mpsc::UnboundedSender<CoordinatorMessage>,
    control: watch::Receiver<WorkerMessage>,
}

impl WorkerContext {
    fn report_error(&self, error: impl ToString) {
        let _ = self.results.send(CoordinatorMessage::Error {
            worker_id: self.worker_id.clone(),
            error: error.to_string(),
        });
    }

    /// Body of the worker thread
    fn run(mut self) -> ExecutionResult<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .inspect_err(|e| self.report_error(format!("failed to build runtime: {}", e)))?;

        let client = self
            .client_factory
            .create()
            .inspect_err(|e| self.report_error(format!("failed to build HTTP client: {}", e)))?;

        let shutdown = self.config.shutdown;
        runtime.block_on(async {
            let mut users = tokio::task::JoinSet::new();
            for id in 0..self.virtual_users {
                let user = VirtualUser::new(
                    id,
                    self.worker_id.clone(),
                    Arc::clone(&self.config),
                    Arc::clone(&self.scenarios),
                    Arc::clone(&client),
                    self.results.clone(),
                    self.control.clone(),
                );
                users.spawn(user.run());
            }

            let _ = self.results.send(CoordinatorMessage::Ready {
                worker_id: self.worker_id.clone(),
                virtual_users: self.virtual_users,
            });

            // A dropped sender means the coordinator is gone: stop hard
            let signal = match self.control.wait_for(|m| m.is_stopping()).await {
                Ok(signal) => *signal,
                Err(_) => WorkerMessage::Shutdown,
            };

            if let (WorkerMessage::Drain, ShutdownMode::Drain { grace }) = (signal, shutdown) {
                debug!("{} draining for up to {}s", self.worker_id, grace.as_secs());
                let drained = tokio::time::timeout(grace, async {
                    while let Some(joined) = users.join_next().await {
                        if let Err(e) = joined {
                            warn!("Virtual user on {} ended abnormally: {}", self.worker_id, e);
                        }
                    }
                })
                .await;
                if drained.is_err() {
                    warn!(
                        "{} grace period elapsed with {} virtual users still running",
                        self.worker_id,
                        users.len()
                    );
                }
            }
        });

        // Anything still in flight is dropped here
        runtime.shutdown_background();

        let _ = self.results.send(CoordinatorMessage::Stopped {
            worker_id: self.worker_id.clone(),
        });
        Ok(())
    }
}

struct WorkerHandle {
    worker_id: String,
    thread: JoinHandle<ExecutionResult<()>>,
}

/// Pool of worker threads generating load for one run
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    control: watch::Sender<WorkerMessage>,
    failures: Vec<WorkerFailure>,
}

impl WorkerPool {
    /// Spawn `config.worker_count` workers with `users_per_worker` virtual users each
    pub fn start(
        config: Arc<TestConfiguration>,
        client_factory: Arc<dyn ClientFactory>,
        results: mpsc::UnboundedSender<CoordinatorMessage>,
    ) -> ExecutionResult<Self> {
        let (control, control_rx) = watch::channel(WorkerMessage::Run);
        let scenarios = Arc::new(config.effective_scenarios());
        let virtual_users = config.users_per_worker();

        info!(
            "Starting {} workers with {} virtual users each",
            config.worker_count, virtual_users
        );

        let mut workers = Vec::new();
        let mut failures = Vec::new();
        for i in 0..config.worker_count {
            let worker_id = format!("worker-{}", i);
            let context = WorkerContext {
                worker_id: worker_id.clone(),
                virtual_users,
                config: Arc::clone(&config),
                scenarios: Arc::clone(&scenarios),
                client_factory: Arc::clone(&client_factory),
                results: results.clone(),
                control: control_rx.clone(),
            };

            match std::thread::Builder::new()
                .name(format!("stampede-{}", worker_id))
                .spawn(move || context.run())
            {
                Ok(thread) => workers.push(WorkerHandle { worker_id, thread }),
                Err(e) => {
                    error!("Failed to spawn {}: {}", worker_id, e);
                    failures.push(WorkerFailure {
                        worker_id,
                        reason: format!("failed to spawn thread: {}", e),
                    });
                }
            }
        }

        if workers.is_empty() {
            return Err(ExecutionError::NoWorkers);
        }

        debug!("{} worker threads running", workers.len());
        Ok(Self {
            workers,
            control,
            failures,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Signal every worker to stop according to `mode`
    pub fn signal_stop(&self, mode: ShutdownMode) {
        let message = match mode {
            ShutdownMode::Hard => WorkerMessage::Shutdown,
            ShutdownMode::Drain { .. } => WorkerMessage::Drain,
        };
        info!("Stopping workers ({:?})", message);
        // Workers that already exited have dropped their receivers
        let _ = self.control.send(message);
    }

    /// Stop all workers and wait up to [`WorkerPool::stop_timeout`] for their threads
    ///
    /// Returns every worker that crashed, could not start or did not stop in
    /// time. A worker failure never fails the run: whatever it streamed
    /// before dying is kept.
    pub async fn shutdown(self, mode: ShutdownMode) -> Vec<WorkerFailure> {
        self.shutdown_within(mode, Self::stop_timeout(mode)).await
    }

    /// Stop all workers, waiting at most `timeout` for their threads
    ///
    /// Threads still running at the deadline are left detached and recorded
    /// as failures.
    pub async fn shutdown_within(self, mode: ShutdownMode, timeout: Duration) -> Vec<WorkerFailure> {
        self.signal_stop(mode);
        let deadline = tokio::time::Instant::now() + timeout;

        let WorkerPool {
            workers,
            control,
            mut failures,
        } = self;

        let joins: Vec<_> = workers
            .into_iter()
            .map(|WorkerHandle { worker_id, thread }| {
                (worker_id, tokio::task::spawn_blocking(move || thread.join()))
            })
            .collect();

        for (worker_id, join) in joins {
            let reason = match tokio::time::timeout_at(deadline, join).await {
                Ok(Ok(Ok(Ok(())))) => continue,
                Ok(Ok(Ok(Err(e)))) => e.to_string(),
                Ok(Ok(Err(panic))) => {
                    format!("worker thread panicked: {}", panic_message(&*panic))
                }
                Ok(Err(e)) => format!("failed to join worker thread: {}", e),
                Err(_) => format!("worker thread did not stop within {:?}", timeout),
            };
            error!("{} failed: {}", worker_id, reason);
            failures.push(WorkerFailure { worker_id, reason });
        }

        drop(control);
        failures
    }

    /// Upper bound on how long `shutdown` should take for `mode`
    pub fn stop_timeout(mode: ShutdownMode) -> Duration {
        match mode {
            ShutdownMode::Hard => Duration::from_secs(5),
            ShutdownMode::Drain { grace } => grace + Duration::from_secs(5),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
