//! Directory scanning engine for dirwatch.
//!
//! This crate walks a directory tree and builds a [`Snapshot`] of every
//! classified file, using jwalk for traversal.
//!
//! # Overview
//!
//! `dirwatch-scan` turns a [`MonitorConfig`] into a snapshot. Key features:
//!
//! - **Parallel traversal** via jwalk/rayon, in name-sorted order
//! - **Classification** by extension into text, image and program files
//! - **Pluggable extraction** through [`MetadataExtractor`]
//! - **Partial scans**: unreadable entries become [`ScanWarning`]s
//! - **Cancellation** through a `CancellationToken`
//!
//! # Example
//!
//! ```rust,no_run
//! use dirwatch_scan::{DirectoryScanner, MonitorConfig};
//!
//! let config = MonitorConfig::new("/path/to/watch");
//! let scanner = DirectoryScanner::new();
//! let snapshot = scanner.scan(&config).unwrap();
//!
//! for record in snapshot.records() {
//!     print!("{}", record.describe());
//! }
//! ```
//!
//! # Custom extractors
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::SystemTime;
//! use dirwatch_scan::{DirectoryScanner, ExtractionError, FileKind, FileMetadata, TextStats};
//!
//! let extractor = |_kind: FileKind, _path: &Path, _created: SystemTime| {
//!     Ok::<_, ExtractionError>(FileMetadata::Text(TextStats::default()))
//! };
//! let scanner = DirectoryScanner::with_extractor(Arc::new(extractor));
//! ```

mod extractor;
mod progress;
mod scanner;

pub use extractor::{ContentExtractor, Language, image_info, program_stats, text_stats};
pub use progress::ScanProgress;
pub use scanner::DirectoryScanner;

// Re-export core types for convenience
pub use dirwatch_core::{
    ExtractionError, FileKind, FileMetadata, FileRecord, ImageInfo, MetadataExtractor,
    MonitorConfig, ProgramStats, ScanError, ScanWarning, Snapshot, SnapshotStats, TextStats,
    WarningKind,
};
