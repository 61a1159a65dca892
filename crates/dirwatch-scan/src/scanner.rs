//! JWalk-based directory scanner producing snapshots.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use compact_str::CompactString;
use globset::GlobSet;
use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use dirwatch_core::{
    ExtractionError, FileKind, FileRecord, MetadataExtractor, MonitorConfig, ScanError,
    ScanWarning, Snapshot, SnapshotStats, WarningKind,
};

use crate::extractor::ContentExtractor;
use crate::progress::ScanProgress;

/// Files between two progress updates.
const PROGRESS_EVERY: u64 = 1000;

/// Walks a root directory and builds a [`Snapshot`] of its classified files.
///
/// The walk runs on jwalk's rayon pool; metadata extraction then runs in
/// parallel over the collected files. Record order always follows the
/// (name-sorted) walk order.
pub struct DirectoryScanner {
    extractor: Arc<dyn MetadataExtractor>,
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl DirectoryScanner {
    /// Create a scanner using the [`ContentExtractor`].
    pub fn new() -> Self {
        Self::with_extractor(Arc::new(ContentExtractor::new()))
    }

    /// Create a scanner with a custom metadata extractor.
    pub fn with_extractor(extractor: Arc<dyn MetadataExtractor>) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            extractor,
            progress_tx,
        }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Perform a full scan of the configured root.
    pub fn scan(&self, config: &MonitorConfig) -> Result<Snapshot, ScanError> {
        self.scan_with_cancel(config, &CancellationToken::new())
    }

    /// Perform a scan that stops with [`ScanError::Interrupted`] once
    /// `cancel` fires.
    pub fn scan_with_cancel(
        &self,
        config: &MonitorConfig,
        cancel: &CancellationToken,
    ) -> Result<Snapshot, ScanError> {
        let start = Instant::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        // An unreadable root is fatal; unreadable subtrees are only warnings.
        std::fs::read_dir(&root_path).map_err(|e| ScanError::io(&root_path, e))?;

        let ignore = Arc::new(config.ignore_matcher()?);
        let mut stats = SnapshotStats::new();
        let mut warnings = Vec::new();

        let pending =
            self.collect_entries(config, &root_path, ignore, cancel, start, &mut stats, &mut warnings)?;

        let extracted = self.extract_all(pending, cancel)?;
        // Extractions already running when the token fired still finish.
        if cancel.is_cancelled() {
            return Err(ScanError::Interrupted);
        }

        let mut records = Vec::with_capacity(extracted.len());
        for result in extracted {
            match result {
                Ok(record) => {
                    stats.record_file(record.kind(), record.size);
                    records.push(record);
                }
                Err((path, err)) => {
                    tracing::warn!(path = %path.display(), error = %err, "metadata extraction failed");
                    warnings.push(ScanWarning::extraction_failed(path, &err));
                }
            }
        }

        let snapshot = Snapshot::from_records(
            root_path,
            records,
            stats,
            start.elapsed(),
            warnings,
        );

        let _ = self.progress_tx.send(ScanProgress {
            files_seen: snapshot.stats.files_seen,
            dirs_seen: snapshot.stats.dirs_seen,
            current_path: snapshot.root.clone(),
            warnings_count: snapshot.warnings.len() as u64,
            elapsed: snapshot.scan_duration,
            finished: true,
        });

        tracing::debug!(
            root = %snapshot.root.display(),
            records = snapshot.len(),
            warnings = snapshot.warnings.len(),
            elapsed_ms = snapshot.scan_duration.as_millis() as u64,
            "scan complete"
        );

        Ok(snapshot)
    }

    /// Walk the tree and collect every classified regular file.
    #[allow(clippy::too_many_arguments)]
    fn collect_entries(
        &self,
        config: &MonitorConfig,
        root_path: &Path,
        ignore: Arc<GlobSet>,
        cancel: &CancellationToken,
        start: Instant,
        stats: &mut SnapshotStats,
        warnings: &mut Vec<ScanWarning>,
    ) -> Result<Vec<PendingFile>, ScanError> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let filter_root = root_path.to_path_buf();
        let walker = WalkDir::new(root_path)
            .parallelism(parallelism)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .sort(true)
            .min_depth(0)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |depth, _path, _state, children| {
                // Pruning here keeps ignored directories from being read at all.
                if depth.is_none() || ignore.is_empty() {
                    return;
                }
                children.retain(|entry| match entry {
                    Ok(e) => !is_ignored(&ignore, &filter_root, &e.path()),
                    Err(_) => true,
                });
            });

        let mut pending = Vec::new();

        for entry_result in walker {
            if cancel.is_cancelled() {
                tracing::debug!(root = %root_path.display(), "scan cancelled during walk");
                return Err(ScanError::Interrupted);
            }

            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let warning = match err.io_error() {
                        Some(io) => ScanWarning::read_error(&path, io),
                        None => ScanWarning::new(&path, err.to_string(), WarningKind::ReadError),
                    };
                    tracing::warn!(path = %path.display(), "skipping unreadable entry: {}", warning.message);
                    warnings.push(warning);
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                stats.dirs_seen += 1;
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            stats.files_seen += 1;
            let path = entry.path();

            let kind = config.classify(&path);
            if !kind.is_classified() {
                stats.record_file(kind, 0);
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    warnings.push(ScanWarning::new(&path, err.to_string(), WarningKind::MetadataError));
                    continue;
                }
            };
            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(err) => {
                    warnings.push(ScanWarning::new(&path, err.to_string(), WarningKind::MetadataError));
                    continue;
                }
            };

            if stats.files_seen % PROGRESS_EVERY == 0 {
                let _ = self.progress_tx.send(ScanProgress {
                    files_seen: stats.files_seen,
                    dirs_seen: stats.dirs_seen,
                    current_path: path.clone(),
                    warnings_count: warnings.len() as u64,
                    elapsed: start.elapsed(),
                    finished: false,
                });
            }

            pending.push(PendingFile {
                name: relative_name(root_path, &path),
                path,
                kind,
                size: metadata.len(),
                modified,
            });
        }

        Ok(pending)
    }

    /// Run the extractor over all pending files, preserving order.
    fn extract_all(
        &self,
        pending: Vec<PendingFile>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Result<FileRecord, (PathBuf, ExtractionError)>>, ScanError> {
        pending
            .into_par_iter()
            .map(|file| {
                if cancel.is_cancelled() {
                    return Err(ScanError::Interrupted);
                }
                Ok(self.extract_one(file))
            })
            .collect()
    }

    fn extract_one(&self, file: PendingFile) -> Result<FileRecord, (PathBuf, ExtractionError)> {
        match self.extractor.extract(file.kind, &file.path, file.modified) {
            Ok(metadata) if metadata.kind() == file.kind => Ok(FileRecord::new(
                file.name,
                file.path,
                file.size,
                metadata,
                file.modified,
            )),
            Ok(metadata) => {
                let err = ExtractionError::malformed(
                    &file.path,
                    file.kind,
                    format!("extractor returned {} metadata", metadata.kind()),
                );
                Err((file.path, err))
            }
            Err(err) => Err((file.path, err)),
        }
    }
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DirectoryScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryScanner")
            .field("subscribers", &self.progress_tx.receiver_count())
            .finish_non_exhaustive()
    }
}

/// A classified file waiting for metadata extraction.
struct PendingFile {
    name: CompactString,
    path: PathBuf,
    kind: FileKind,
    size: u64,
    modified: SystemTime,
}

/// Snapshot key for `path`: relative to `root`, joined with `/`.
pub(crate) fn relative_name(root: &Path, path: &Path) -> CompactString {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut name = CompactString::default();
    for (i, component) in relative.components().enumerate() {
        if i > 0 {
            name.push('/');
        }
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    name
}

fn is_ignored(ignore: &GlobSet, root: &Path, path: &Path) -> bool {
    let by_name = path
        .file_name()
        .is_some_and(|name| ignore.is_match(Path::new(name)));
    by_name || ignore.is_match(relative_name(root, path).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("docs")).unwrap();
        fs::create_dir(root.join("src")).unwrap();
        fs::create_dir(root.join("docs/old")).unwrap();

        fs::write(root.join("readme.txt"), "hello world\n").unwrap();
        fs::write(root.join("docs/guide.txt"), "one\ntwo\nthree\n").unwrap();
        fs::write(root.join("docs/old/notes.txt"), "test").unwrap();
        fs::write(root.join("src/main.py"), "def main():\n    pass\n").unwrap();
        fs::write(root.join("data.bin"), [0u8, 1, 2]).unwrap();

        temp
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let config = MonitorConfig::new(temp.path());

        let scanner = DirectoryScanner::new();
        let snapshot = scanner.scan(&config).unwrap();

        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.stats.files_seen, 5);
        assert_eq!(snapshot.stats.unclassified, 1);
        assert_eq!(snapshot.stats.dirs_seen, 3);
        assert!(snapshot.get("data.bin").is_none());
        assert_eq!(snapshot.get("src/main.py").unwrap().kind(), FileKind::Program);
        assert!(!snapshot.has_warnings());
    }

    #[test]
    fn test_records_follow_sorted_walk() {
        let temp = create_test_tree();
        let snapshot = DirectoryScanner::new()
            .scan(&MonitorConfig::new(temp.path()))
            .unwrap();

        let names: Vec<_> = snapshot.records().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            ["docs/guide.txt", "docs/old/notes.txt", "readme.txt", "src/main.py"]
        );
    }

    #[test]
    fn test_ignore_patterns() {
        let temp = create_test_tree();
        let config = MonitorConfig::builder()
            .root(temp.path())
            .ignore_patterns(vec!["docs".to_string()])
            .build()
            .unwrap();

        let snapshot = DirectoryScanner::new().scan(&config).unwrap();

        assert!(snapshot.records().all(|r| !r.name.starts_with("docs")));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let config = MonitorConfig::new(temp.path().join("nope"));

        let err = DirectoryScanner::new().scan(&config).unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let temp = create_test_tree();
        let config = MonitorConfig::new(temp.path().join("readme.txt"));

        let err = DirectoryScanner::new().scan(&config).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[test]
    fn test_cancelled_scan_is_interrupted() {
        let temp = create_test_tree();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = DirectoryScanner::new()
            .scan_with_cancel(&MonitorConfig::new(temp.path()), &cancel)
            .unwrap_err();
        assert!(err.is_interrupted());
    }

    #[test]
    fn test_cancel_during_extraction_is_interrupted() {
        let temp = create_test_tree();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let extractor = move |kind: FileKind, path: &Path, created: SystemTime| {
            trigger.cancel();
            ContentExtractor::new().extract(kind, path, created)
        };
        let scanner = DirectoryScanner::with_extractor(Arc::new(extractor));

        let err = scanner
            .scan_with_cancel(&MonitorConfig::new(temp.path()), &cancel)
            .unwrap_err();
        assert!(err.is_interrupted());
    }

    #[test]
    fn test_extraction_failure_becomes_warning() {
        let temp = create_test_tree();
        let extractor = |kind: FileKind, path: &Path, created: SystemTime| {
            if path.ends_with("guide.txt") {
                Err(ExtractionError::malformed(path, kind, "boom"))
            } else {
                ContentExtractor::new().extract(kind, path, created)
            }
        };
        let scanner = DirectoryScanner::with_extractor(Arc::new(extractor));

        let snapshot = scanner.scan(&MonitorConfig::new(temp.path())).unwrap();

        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.get("docs/guide.txt").is_none());
        assert_eq!(snapshot.warnings.len(), 1);
        assert_eq!(snapshot.warnings[0].kind, WarningKind::ExtractionFailed);
    }

    #[test]
    fn test_final_progress_update() {
        let temp = create_test_tree();
        let scanner = DirectoryScanner::new();
        let mut rx = scanner.subscribe();

        scanner.scan(&MonitorConfig::new(temp.path())).unwrap();

        let mut last = None;
        while let Ok(progress) = rx.try_recv() {
            last = Some(progress);
        }
        let last = last.unwrap();
        assert!(last.finished);
        assert_eq!(last.files_seen, 5);
    }

    #[test]
    fn test_relative_name() {
        let root = Path::new("/watched");
        assert_eq!(relative_name(root, Path::new("/watched/a.txt")), "a.txt");
        assert_eq!(relative_name(root, Path::new("/watched/x/y/b.py")), "x/y/b.py");
    }
}
