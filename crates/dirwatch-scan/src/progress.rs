//! Scan progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information during a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    /// Regular files visited so far.
    pub files_seen: u64,
    /// Directories visited so far.
    pub dirs_seen: u64,
    /// Current path being scanned.
    pub current_path: PathBuf,
    /// Number of warnings recorded.
    pub warnings_count: u64,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
    /// Set on the final update of a scan.
    pub finished: bool,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_seen as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items scanned (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files_seen + self.dirs_seen
    }
}
