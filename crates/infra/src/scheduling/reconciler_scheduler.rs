//! Periodic reconciliation scheduler.
//!
//! Runs the reconciler's tick on a fixed interval so due time-off
//! schedules activate and expired ones restore without an external
//! trigger. One scheduler owns one background task; stopping cancels the
//! loop and joins the task with a timeout.

use std::sync::Arc;
use std::time::Duration;

use coverageiq_core::OooReconciler;
use coverageiq_domain::ReconcilerConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use super::error::{SchedulerError, SchedulerResult};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Run one tick immediately on start instead of waiting a full
    /// interval for the first pass.
    pub tick_at_start: bool,
    /// When false, `start()` is a logged no-op.
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(
                coverageiq_domain::constants::DEFAULT_TICK_INTERVAL_SECS,
            ),
            tick_at_start: true,
            enabled: true,
        }
    }
}

impl From<&ReconcilerConfig> for SchedulerConfig {
    fn from(config: &ReconcilerConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.tick_interval_seconds),
            tick_at_start: config.tick_at_start,
            enabled: config.enabled,
        }
    }
}

pub struct ReconcilerScheduler {
    reconciler: Arc<OooReconciler>,
    config: SchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl ReconcilerScheduler {
    pub fn new(reconciler: Arc<OooReconciler>, config: SchedulerConfig) -> Self {
        Self {
            reconciler,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    #[instrument(skip(self))]
    pub async fn start(&self) -> SchedulerResult<()> {
        if !self.config.enabled {
            info!("reconciler scheduler disabled by configuration");
            return Ok(());
        }
        let mut handle = self.task_handle.lock().await;
        if handle.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let reconciler = Arc::clone(&self.reconciler);
        let config = self.config.clone();
        let token = self.cancellation_token.clone();
        *handle = Some(tokio::spawn(async move {
            tick_loop(reconciler, config, token).await;
        }));

        info!(interval = ?self.config.interval, "reconciler scheduler started");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn stop(&self) -> SchedulerResult<()> {
        let mut handle = self.task_handle.lock().await;
        let Some(task) = handle.take() else {
            return Err(SchedulerError::NotRunning);
        };

        self.cancellation_token.cancel();
        tokio::time::timeout(SHUTDOWN_TIMEOUT, task)
            .await
            .map_err(|source| SchedulerError::Timeout {
                duration: SHUTDOWN_TIMEOUT,
                source,
            })??;

        info!("reconciler scheduler stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.task_handle.lock().await.is_some()
    }
}

impl Drop for ReconcilerScheduler {
    fn drop(&mut self) {
        // Stops the loop even when stop() was never awaited.
        self.cancellation_token.cancel();
    }
}

async fn tick_loop(
    reconciler: Arc<OooReconciler>,
    config: SchedulerConfig,
    token: CancellationToken,
) {
    if config.tick_at_start {
        run_tick(&reconciler).await;
    }
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("reconciler scheduler loop cancelled");
                break;
            }
            _ = tokio::time::sleep(config.interval) => {
                run_tick(&reconciler).await;
            }
        }
    }
}

async fn run_tick(reconciler: &OooReconciler) {
    match reconciler.tick().await {
        Ok(outcome) if outcome.is_empty() => {
            debug!("reconciliation tick found nothing to do");
        }
        Ok(outcome) => {
            info!(
                activated = outcome.activated.len(),
                restored = outcome.restored.len(),
                "reconciliation tick applied changes"
            );
        }
        // The next tick retries; a failed pass never kills the loop.
        Err(e) => error!(error = %e, "reconciliation tick failed"),
    }
}
