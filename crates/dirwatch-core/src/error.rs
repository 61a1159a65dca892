//! Error types for scanning, extraction and monitoring.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::FileKind;

/// A configuration value failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid configuration: {message}")]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that abort a scan.
///
/// A failed scan never replaces the retained snapshot.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scan was cancelled before it finished.
    #[error("Scan interrupted")]
    Interrupted,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Whether the error came from cancellation rather than the filesystem.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

impl From<ConfigError> for ScanError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfig {
            message: err.message,
        }
    }
}

/// Failure to extract metadata for a single file.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content did not match the expected format.
    #[error("Malformed {kind} file {path}: {message}")]
    Malformed {
        path: PathBuf,
        kind: FileKind,
        message: String,
    },

    /// The extractor has no support for this kind.
    #[error("No extractor for {kind} files")]
    Unsupported { kind: FileKind },
}

impl ExtractionError {
    /// Create a read error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a format error.
    pub fn malformed(path: impl Into<PathBuf>, kind: FileKind, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a directory or entry.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// The metadata extractor failed; the file was skipped.
    ExtractionFailed,
}

/// Non-fatal warning encountered during scan.
///
/// Warnings describe the parts of the tree a scan had to skip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a permission denied warning.
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Permission denied: {}", path.display()),
            path,
            kind: WarningKind::PermissionDenied,
        }
    }

    /// Create a read error warning.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::permission_denied(path);
        }
        Self {
            message: format!("Read error: {error}"),
            path,
            kind: WarningKind::ReadError,
        }
    }

    /// Create a warning for a file whose metadata could not be extracted.
    pub fn extraction_failed(path: impl Into<PathBuf>, error: &ExtractionError) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
            kind: WarningKind::ExtractionFailed,
        }
    }
}

impl std::fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
        assert!(!err.is_interrupted());
    }

    #[test]
    fn test_config_error_converts() {
        let err: ScanError = ConfigError::new("bad interval").into();
        match err {
            ScanError::InvalidConfig { message } => assert_eq!(message, "bad interval"),
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_warning_creation() {
        let warning = ScanWarning::permission_denied("/test/path");
        assert_eq!(warning.kind, WarningKind::PermissionDenied);
        assert!(warning.message.contains("Permission denied"));
    }

    #[test]
    fn test_read_error_maps_permission_denied() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = ScanWarning::read_error("/locked", &err);
        assert_eq!(warning.kind, WarningKind::PermissionDenied);
    }

    #[test]
    fn test_extraction_warning_carries_message() {
        let err = ExtractionError::malformed("/img.png", FileKind::Image, "bad signature");
        let warning = ScanWarning::extraction_failed("/img.png", &err);
        assert_eq!(warning.kind, WarningKind::ExtractionFailed);
        assert!(warning.message.contains("bad signature"));
    }
}
