//! Periodic background cleanup of expired media.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lethe_core::{defaults, Result};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::manager::LifecycleManager;

/// Configuration for the cleanup scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Seconds between cleanup passes.
    pub interval_secs: u64,
    /// Whether [`CleanupScheduler::start`] spawns the loop at all.
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::CLEANUP_INTERVAL_SECS,
            enabled: true,
        }
    }
}

impl SchedulerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `LETHE_CLEANUP_ENABLED` | `true` | Enable/disable periodic cleanup |
    /// | `LETHE_CLEANUP_INTERVAL_SECS` | `300` | Seconds between passes (min 1) |
    pub fn from_env() -> Self {
        let enabled = std::env::var(defaults::ENV_CLEANUP_ENABLED)
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let interval_secs = std::env::var(defaults::ENV_CLEANUP_INTERVAL_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::CLEANUP_INTERVAL_SECS)
            .max(1);

        Self {
            interval_secs,
            enabled,
        }
    }

    /// Set the interval between passes.
    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }

    /// Enable or disable the periodic loop.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Event emitted by the cleanup scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Periodic loop started.
    Started,
    /// A pass finished; carries the ids it deleted (possibly none).
    PassCompleted { deleted: BTreeSet<String> },
    /// A pass could not run to completion.
    PassFailed { error: String },
    /// Periodic loop stopped.
    Stopped,
}

/// Callback invoked with the ids deleted by each pass.
pub type CleanupObserver = Arc<dyn Fn(&BTreeSet<String>) + Send + Sync>;

/// Everything a single pass needs, cloned into the loop task.
#[derive(Clone)]
struct PassContext {
    manager: Arc<LifecycleManager>,
    observer: Option<CleanupObserver>,
    event_tx: broadcast::Sender<SchedulerEvent>,
}

impl PassContext {
    async fn run_pass(&self) -> Result<BTreeSet<String>> {
        let start = Instant::now();
        match self.manager.cleanup_aged().await {
            Ok(deleted) => {
                if let Some(observer) = &self.observer {
                    observer(&deleted);
                }
                debug!(
                    deleted = deleted.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Cleanup pass completed"
                );
                let _ = self.event_tx.send(SchedulerEvent::PassCompleted {
                    deleted: deleted.clone(),
                });
                Ok(deleted)
            }
            Err(e) => {
                error!(error = %e, "Cleanup pass failed");
                let _ = self.event_tx.send(SchedulerEvent::PassFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_loop(self, interval: Duration, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(interval_secs = interval.as_secs(), "Cleanup scheduler started");
        let _ = self.event_tx.send(SchedulerEvent::Started);

        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            // Failures are already logged and broadcast; the loop keeps going.
            let _ = self.run_pass().await;

            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = sleep(interval) => {}
            }
        }

        let _ = self.event_tx.send(SchedulerEvent::Stopped);
        info!("Cleanup scheduler stopped");
    }
}

struct RunningLoop {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

/// Runs [`LifecycleManager::cleanup_aged`] immediately on start and then
/// every configured interval until stopped.
pub struct CleanupScheduler {
    ctx: PassContext,
    config: SchedulerConfig,
    running: Mutex<Option<RunningLoop>>,
}

impl CleanupScheduler {
    pub fn new(manager: Arc<LifecycleManager>, config: SchedulerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            ctx: PassContext {
                manager,
                observer: None,
                event_tx,
            },
            config,
            running: Mutex::new(None),
        }
    }

    /// Attach a callback receiving each pass's deleted ids.
    pub fn with_observer(mut self, observer: CleanupObserver) -> Self {
        self.ctx.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Get a receiver for scheduler events.
    pub fn events(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.ctx.event_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Spawn the periodic loop on the current tokio runtime.
    ///
    /// Returns `false` without doing anything if the loop is already running
    /// or the scheduler is disabled.
    pub fn start(&self) -> bool {
        if !self.config.enabled {
            info!("Cleanup scheduler is disabled, not starting");
            return false;
        }

        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if running.is_some() {
            debug!("Cleanup scheduler already running");
            return false;
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(self.ctx.clone().run_loop(self.config.interval(), shutdown_rx));
        *running = Some(RunningLoop { shutdown_tx, task });
        true
    }

    /// Signal the loop to stop and wait for it to exit.
    ///
    /// A pass already in progress finishes first. Returns `false` if the loop
    /// was not running.
    pub async fn stop(&self) -> bool {
        let handle = self
            .running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(RunningLoop { shutdown_tx, task }) = handle else {
            return false;
        };

        // The receiver only disappears once the loop has already exited.
        let _ = shutdown_tx.send(()).await;
        if let Err(e) = task.await {
            error!(error = ?e, "Cleanup scheduler task panicked");
        }
        true
    }

    /// Run one pass on the caller's task, independent of the loop.
    pub async fn run_once(&self) -> Result<BTreeSet<String>> {
        self.ctx.run_pass().await
    }
}

impl std::fmt::Debug for CleanupScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupScheduler")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}
