//! File records and their kind-specific metadata.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Display format for record timestamps.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Classification of a file by its extension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FileKind {
    /// Plain text document.
    Text,
    /// Raster image.
    Image,
    /// Program source file.
    Program,
    /// Anything else. Never stored in a snapshot.
    Unclassified,
}

impl FileKind {
    /// Heading used by [`FileRecord::describe`].
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Text => "Text File",
            FileKind::Image => "Image File",
            FileKind::Program => "Program File",
            FileKind::Unclassified => "File",
        }
    }

    /// Whether files of this kind are recorded in snapshots.
    pub fn is_classified(&self) -> bool {
        !matches!(self, FileKind::Unclassified)
    }
}

/// Line, word and character counts of a text file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    pub line_count: u64,
    pub word_count: u64,
    pub char_count: u64,
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// Create image dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for ImageInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Structural counts of a program source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramStats {
    pub line_count: u64,
    pub class_count: u64,
    pub method_count: u64,
}

/// Kind-specific metadata attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileMetadata {
    Text(TextStats),
    Image(ImageInfo),
    Program(ProgramStats),
}

impl FileMetadata {
    /// The kind this metadata belongs to.
    pub fn kind(&self) -> FileKind {
        match self {
            FileMetadata::Text(_) => FileKind::Text,
            FileMetadata::Image(_) => FileKind::Image,
            FileMetadata::Program(_) => FileKind::Program,
        }
    }

    /// Append the kind-specific lines of a description.
    fn describe_into(&self, out: &mut String) {
        // Writing to a String cannot fail.
        let _ = match self {
            FileMetadata::Text(stats) => write!(
                out,
                "Line Count: {}\nWord Count: {}\nCharacter Count: {}\n",
                stats.line_count, stats.word_count, stats.char_count
            ),
            FileMetadata::Image(info) => writeln!(out, "Image Size: {info}"),
            FileMetadata::Program(stats) => write!(
                out,
                "Line Count: {}\nClass Count: {}\nMethod Count: {}\n",
                stats.line_count, stats.class_count, stats.method_count
            ),
        };
    }
}

/// A classified file observed by a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Snapshot key: path relative to the scan root, `/`-separated.
    pub name: CompactString,

    /// Absolute path at scan time.
    pub path: PathBuf,

    /// Size in bytes.
    pub size: u64,

    /// Kind-specific metadata.
    pub metadata: FileMetadata,

    /// Modification time at first observation.
    pub created_time: SystemTime,

    /// Modification time of the last detected change.
    pub updated_time: SystemTime,

    /// Modification time observed by the scan that produced this record.
    pub modified: SystemTime,
}

impl FileRecord {
    /// Create a record for a file seen for the first time.
    pub fn new(
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        size: u64,
        metadata: FileMetadata,
        modified: SystemTime,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
            metadata,
            created_time: modified,
            updated_time: modified,
            modified,
        }
    }

    /// The record's classification.
    pub fn kind(&self) -> FileKind {
        self.metadata.kind()
    }

    /// Human-readable multi-line summary.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}: {}", self.kind().label(), self.name);
        let _ = writeln!(out, "Created Time: {}", format_time(self.created_time));
        let _ = writeln!(out, "Updated Time: {}", format_time(self.updated_time));
        self.metadata.describe_into(&mut out);
        out
    }
}

/// Format a timestamp in local time.
pub fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(TIME_FORMAT).to_string()
}
