//! The retained snapshot and the scan-diff-publish cycle.

use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dirwatch_core::{
    ChangeEvent, FileRecord, FileStatus, MetadataExtractor, MonitorConfig, ScanError, Snapshot,
    format_time,
};
use dirwatch_scan::DirectoryScanner;

use crate::diff::{Reconciled, reconcile};
use crate::error::MonitorError;

/// Buffered change events per subscriber before the slowest one lags.
const EVENT_CAPACITY: usize = 1024;

/// Owns the current snapshot of one directory tree.
///
/// Readers always see a complete snapshot: scans build the next generation
/// off to the side and swap it in under a short write lock. At most one scan
/// runs at a time.
pub struct Monitor {
    config: MonitorConfig,
    scanner: DirectoryScanner,
    current: RwLock<Arc<Snapshot>>,
    scan_lock: Mutex<()>,
    events_tx: broadcast::Sender<ChangeEvent>,
}

impl Monitor {
    /// Create a monitor using the built-in content extractor.
    ///
    /// The retained snapshot starts empty, so the first scan reports every
    /// classified file as added.
    pub fn new(config: MonitorConfig) -> Result<Self, MonitorError> {
        Self::with_scanner(config, DirectoryScanner::new())
    }

    /// Create a monitor with a custom metadata extractor.
    pub fn with_extractor(
        config: MonitorConfig,
        extractor: Arc<dyn MetadataExtractor>,
    ) -> Result<Self, MonitorError> {
        Self::with_scanner(config, DirectoryScanner::with_extractor(extractor))
    }

    fn with_scanner(config: MonitorConfig, scanner: DirectoryScanner) -> Result<Self, MonitorError> {
        config.validate()?;

        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let current = RwLock::new(Arc::new(Snapshot::empty(&config.root)));
        Ok(Self {
            config,
            scanner,
            current,
            scan_lock: Mutex::new(()),
            events_tx,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Subscribe to change events from subsequent scans.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events_tx.subscribe()
    }

    /// The currently retained snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Scan now, waiting for any scan already in progress.
    pub fn scan_once(&self) -> Result<Vec<ChangeEvent>, ScanError> {
        self.scan_once_with_cancel(&CancellationToken::new())
    }

    /// Scan now, aborting with [`ScanError::Interrupted`] once `cancel`
    /// fires. An interrupted scan leaves the retained snapshot untouched.
    pub fn scan_once_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ChangeEvent>, ScanError> {
        let _guard = self.scan_lock.lock();
        self.run_scan(cancel)
    }

    /// Scan unless another scan is in progress, in which case `None` is
    /// returned immediately.
    pub fn try_scan(
        &self,
        cancel: &CancellationToken,
    ) -> Option<Result<Vec<ChangeEvent>, ScanError>> {
        let _guard = self.scan_lock.try_lock()?;
        Some(self.run_scan(cancel))
    }

    fn run_scan(&self, cancel: &CancellationToken) -> Result<Vec<ChangeEvent>, ScanError> {
        let previous = self.snapshot();

        let scanned = match self.scanner.scan_with_cancel(&self.config, cancel) {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_interrupted() => {
                debug!("scan interrupted; keeping previous snapshot");
                return Err(e);
            }
            Err(e) => {
                warn!(error = %e, "scan failed; keeping previous snapshot");
                return Err(e);
            }
        };

        let Reconciled {
            snapshot: mut next,
            events,
        } = reconcile(&previous, scanned);

        {
            let mut current = self.current.write();
            // A commit may have landed while we were scanning.
            next.taken_at = current.taken_at;
            *current = Arc::new(next);
        }

        for event in &events {
            info!(kind = %event.kind, name = %event.name, "{event}");
            // No subscribers is fine.
            let _ = self.events_tx.send(event.clone());
        }

        debug!(changes = events.len(), "scan published");
        Ok(events)
    }

    /// Set the baseline used by [`status`](Self::status) to the current
    /// time and return it.
    pub fn commit(&self) -> SystemTime {
        let now = SystemTime::now();
        let mut current = self.current.write();
        let committed = current.with_baseline(Some(now));
        *current = Arc::new(committed);
        info!(baseline = %format_time(now), "baseline committed");
        now
    }

    /// The retained record for `name`, if any.
    pub fn info(&self, name: &str) -> Option<FileRecord> {
        self.current.read().get(name).cloned()
    }

    /// Whether each retained record changed since the last commit.
    pub fn status(&self) -> Vec<FileStatus> {
        self.snapshot().status()
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("root", &self.config.root)
            .field("records", &self.current.read().len())
            .finish_non_exhaustive()
    }
}
