//! Snapshot container and statistics.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ScanWarning;
use crate::record::{FileKind, FileRecord};

/// Summary statistics for a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotStats {
    /// Regular files visited by the walk.
    pub files_seen: u64,
    /// Directories visited by the walk.
    pub dirs_seen: u64,
    /// Files skipped because no kind matched their extension.
    pub unclassified: u64,
    /// Text records.
    pub text_files: u64,
    /// Image records.
    pub image_files: u64,
    /// Program records.
    pub program_files: u64,
    /// Total size of recorded files in bytes.
    pub total_size: u64,
}

impl SnapshotStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a recorded file.
    pub fn record_file(&mut self, kind: FileKind, size: u64) {
        match kind {
            FileKind::Text => self.text_files += 1,
            FileKind::Image => self.image_files += 1,
            FileKind::Program => self.program_files += 1,
            FileKind::Unclassified => {
                self.unclassified += 1;
                return;
            }
        }
        self.total_size += size;
    }

    /// Number of files that made it into the snapshot.
    pub fn recorded(&self) -> u64 {
        self.text_files + self.image_files + self.program_files
    }
}

/// Whether a record changed since the last `commit()` baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    pub name: CompactString,
    pub changed_since_baseline: bool,
}

/// Every classified file in the monitored tree at one point in time.
///
/// Snapshots are built by a full walk and published whole. Once shared they
/// are never modified; later scans and `commit()` produce new values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Root path that was scanned.
    pub root: PathBuf,

    /// Records keyed by name, in walk order.
    entries: IndexMap<CompactString, FileRecord>,

    /// Baseline set by `commit()`. `None` until the first commit.
    pub taken_at: Option<SystemTime>,

    /// When the scan producing this snapshot finished.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Summary statistics.
    pub stats: SnapshotStats,

    /// Entries the scan had to skip.
    pub warnings: Vec<ScanWarning>,
}

impl Snapshot {
    /// Snapshot of a tree that has not been scanned yet.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: IndexMap::new(),
            taken_at: None,
            scanned_at: UNIX_EPOCH,
            scan_duration: Duration::ZERO,
            stats: SnapshotStats::new(),
            warnings: Vec::new(),
        }
    }

    /// Build a snapshot from records in walk order.
    ///
    /// Keys are taken from each record's name, so they always agree.
    pub fn from_records(
        root: impl Into<PathBuf>,
        records: impl IntoIterator<Item = FileRecord>,
        stats: SnapshotStats,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        let entries = records
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        Self {
            root: root.into(),
            entries,
            taken_at: None,
            scanned_at: SystemTime::now(),
            scan_duration,
            stats,
            warnings,
        }
    }

    /// Look up a record by name.
    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.entries.get(name)
    }

    /// Check whether a name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate records in walk order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.entries.values()
    }

    /// Iterate `(name, record)` pairs in walk order.
    pub fn iter(&self) -> impl Iterator<Item = (&CompactString, &FileRecord)> {
        self.entries.iter()
    }

    /// Rewrite every record in place, keeping keys and order.
    ///
    /// `f` must not rename records.
    pub fn map_records(mut self, mut f: impl FnMut(FileRecord) -> FileRecord) -> Self {
        self.entries = self
            .entries
            .into_iter()
            .map(|(key, record)| {
                let record = f(record);
                debug_assert_eq!(key, record.name);
                (key, record)
            })
            .collect();
        self
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Copy of this snapshot with a new baseline.
    pub fn with_baseline(&self, baseline: Option<SystemTime>) -> Self {
        Self {
            taken_at: baseline,
            ..self.clone()
        }
    }

    /// Per-record comparison of `updated_time` against the baseline.
    ///
    /// Times are compared at whole-second resolution. Without a baseline
    /// every record reports as changed.
    pub fn status(&self) -> Vec<FileStatus> {
        let baseline = self.taken_at.map(whole_seconds);
        self.entries
            .values()
            .map(|record| FileStatus {
                name: record.name.clone(),
                changed_since_baseline: Some(whole_seconds(record.updated_time)) != baseline,
            })
            .collect()
    }
}

/// Seconds relative to the Unix epoch, negative for earlier times.
fn whole_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => -(before.duration().as_secs_f64().ceil() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FileMetadata, TextStats};

    fn text_record(name: &str, modified: SystemTime) -> FileRecord {
        FileRecord::new(
            name,
            format!("/root/{name}"),
            10,
            FileMetadata::Text(TextStats::default()),
            modified,
        )
    }

    #[test]
    fn test_keys_match_names() {
        let now = SystemTime::now();
        let snapshot = Snapshot::from_records(
            "/root",
            vec![text_record("a.txt", now), text_record("dir/b.txt", now)],
            SnapshotStats::new(),
            Duration::ZERO,
            Vec::new(),
        );
        for (key, record) in snapshot.iter() {
            assert_eq!(key, &record.name);
        }
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains("dir/b.txt"));
    }

    #[test]
    fn test_records_keep_walk_order() {
        let now = SystemTime::now();
        let snapshot = Snapshot::from_records(
            "/root",
            vec![
                text_record("z.txt", now),
                text_record("a.txt", now),
                text_record("m.txt", now),
            ],
            SnapshotStats::new(),
            Duration::ZERO,
            Vec::new(),
        );
        let names: Vec<_> = snapshot.records().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["z.txt", "a.txt", "m.txt"]);
    }

    #[test]
    fn test_status_without_baseline_reports_changed() {
        let snapshot = Snapshot::from_records(
            "/root",
            vec![text_record("a.txt", SystemTime::now())],
            SnapshotStats::new(),
            Duration::ZERO,
            Vec::new(),
        );
        let status = snapshot.status();
        assert_eq!(status.len(), 1);
        assert!(status[0].changed_since_baseline);
    }

    #[test]
    fn test_status_against_baseline() {
        let t = UNIX_EPOCH + Duration::from_millis(1_700_000_000_250);
        let snapshot = Snapshot::from_records(
            "/root",
            vec![
                text_record("same.txt", t),
                text_record("later.txt", t + Duration::from_secs(5)),
            ],
            SnapshotStats::new(),
            Duration::ZERO,
            Vec::new(),
        );
        // Sub-second differences are ignored.
        let committed = snapshot.with_baseline(Some(t + Duration::from_millis(500)));
        let status = committed.status();
        assert!(!status[0].changed_since_baseline);
        assert!(status[1].changed_since_baseline);
        assert_eq!(committed.len(), snapshot.len());
    }

    #[test]
    fn test_stats_record_file() {
        let mut stats = SnapshotStats::new();
        stats.record_file(FileKind::Text, 100);
        stats.record_file(FileKind::Image, 50);
        stats.record_file(FileKind::Unclassified, 1000);
        assert_eq!(stats.recorded(), 2);
        assert_eq!(stats.unclassified, 1);
        assert_eq!(stats.total_size, 150);
    }
}
