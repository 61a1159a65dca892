//! Core types and traits for dirwatch.
//!
//! This crate provides the data model shared by the scanner and the
//! monitor: file records, snapshots, change events, configuration and the
//! metadata extractor interface.

mod config;
mod error;
mod event;
mod extract;
mod record;
mod snapshot;

pub use config::{DEFAULT_INTERVAL_SECS, MonitorConfig, MonitorConfigBuilder};
pub use error::{ConfigError, ExtractionError, ScanError, ScanWarning, WarningKind};
pub use event::{ChangeEvent, ChangeKind};
pub use extract::MetadataExtractor;
pub use record::{
    FileKind, FileMetadata, FileRecord, ImageInfo, ProgramStats, TIME_FORMAT, TextStats,
    format_time,
};
pub use snapshot::{FileStatus, Snapshot, SnapshotStats};
