//! Fixed-interval scan scheduling.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::MonitorError;
use crate::monitor::Monitor;

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Running {
    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Runs [`Monitor`] scans on a fixed interval.
///
/// The first scan starts immediately. Ticks that arrive while a scan is
/// still running are skipped, so scans never overlap. Must be started from
/// within a tokio runtime.
pub struct Scheduler {
    monitor: Arc<Monitor>,
    running: Mutex<Option<Running>>,
}

impl Scheduler {
    pub fn new(monitor: Arc<Monitor>) -> Self {
        Self {
            monitor,
            running: Mutex::new(None),
        }
    }

    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    /// Start scanning every `interval`.
    pub fn start(&self, interval: Duration) -> Result<(), MonitorError> {
        if interval.is_zero() {
            return Err(MonitorError::invalid_config("interval must be positive"));
        }

        let mut running = self.running.lock();
        if running.as_ref().is_some_and(Running::is_live) {
            return Err(MonitorError::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_ticks(
            Arc::clone(&self.monitor),
            interval,
            cancel.clone(),
        ));
        *running = Some(Running { cancel, handle });

        info!(
            root = %self.monitor.config().root.display(),
            interval_ms = interval.as_millis() as u64,
            "scheduler started"
        );
        Ok(())
    }

    /// Stop scheduling and wait for the in-flight scan, if any, to end.
    ///
    /// The in-flight scan is interrupted and its result discarded. Returns
    /// `false` if the scheduler was not running.
    pub async fn stop(&self) -> bool {
        let Some(task) = self.running.lock().take() else {
            return false;
        };

        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            warn!(error = %e, "scheduler task ended abnormally");
        }
        info!("scheduler stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().as_ref().is_some_and(Running::is_live)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(task) = self.running.get_mut().take() {
            task.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("monitor", &self.monitor)
            .field("running", &self.is_running())
            .finish()
    }
}

async fn run_ticks(monitor: Arc<Monitor>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let timeout = monitor.config().scan_timeout();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        run_tick(&monitor, &cancel, timeout).await;
    }
}

async fn run_tick(monitor: &Arc<Monitor>, cancel: &CancellationToken, timeout: Option<Duration>) {
    let tick_cancel = cancel.child_token();
    let mut worker = {
        let monitor = Arc::clone(monitor);
        let tick_cancel = tick_cancel.clone();
        tokio::task::spawn_blocking(move || monitor.try_scan(&tick_cancel))
    };

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut worker).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "scan timed out; interrupting");
                tick_cancel.cancel();
                worker.await
            }
        },
        None => worker.await,
    };

    match joined {
        Ok(None) => debug!("previous scan still running; tick skipped"),
        Ok(Some(Ok(events))) => debug!(changes = events.len(), "tick complete"),
        // Already logged by the monitor.
        Ok(Some(Err(_))) => {}
        Err(e) => warn!(error = %e, "scan task failed"),
    }
}
