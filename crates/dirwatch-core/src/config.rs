//! Monitor configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ScanError};
use crate::record::FileKind;

/// Default scheduler interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Configuration for scanning and scheduling.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct MonitorConfig {
    /// Root path to monitor.
    pub root: PathBuf,

    /// Seconds between scheduled scans.
    #[builder(default = "DEFAULT_INTERVAL_SECS")]
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Abort a scan that runs longer than this many seconds.
    #[builder(default)]
    #[serde(default)]
    pub scan_timeout_secs: Option<u64>,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Glob patterns matched against entry names and relative paths.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Number of threads for the walk (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Extensions classified as text, without the leading dot.
    #[builder(default = "default_text_extensions()")]
    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,

    /// Extensions classified as images.
    #[builder(default = "default_image_extensions()")]
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Extensions classified as program sources.
    #[builder(default = "default_program_extensions()")]
    #[serde(default = "default_program_extensions")]
    pub program_extensions: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_text_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}

fn default_image_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}

fn default_program_extensions() -> Vec<String> {
    vec!["py".to_string(), "java".to_string()]
}

impl MonitorConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if self.interval_secs == Some(0) {
            return Err("Interval must be at least one second".to_string());
        }
        if self.scan_timeout_secs == Some(Some(0)) {
            return Err("Scan timeout must be at least one second".to_string());
        }
        if let Some(ref patterns) = self.ignore_patterns {
            for pattern in patterns {
                Glob::new(pattern).map_err(|e| format!("Invalid ignore pattern: {e}"))?;
            }
        }
        Ok(())
    }
}

impl MonitorConfig {
    /// Create a new config builder.
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// Create a simple config for monitoring a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            scan_timeout_secs: None,
            follow_symlinks: false,
            max_depth: None,
            ignore_patterns: Vec::new(),
            threads: 0,
            include_hidden: true,
            text_extensions: default_text_extensions(),
            image_extensions: default_image_extensions(),
            program_extensions: default_program_extensions(),
        }
    }

    /// Load a config from a TOML file.
    ///
    /// A relative `root` in the file is resolved against the file's directory.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
        let mut config = Self::from_toml_str(&contents)?;
        if config.root.is_relative() {
            if let Some(dir) = path.parent() {
                config.root = dir.join(&config.root);
            }
        }
        Ok(config)
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ScanError> {
        let config: Self = toml::from_str(contents).map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the builder enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::new("Root path cannot be empty"));
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::new("Interval must be at least one second"));
        }
        if self.scan_timeout_secs == Some(0) {
            return Err(ConfigError::new("Scan timeout must be at least one second"));
        }
        self.ignore_matcher()?;
        Ok(())
    }

    /// Scheduler interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Per-scan timeout, if any.
    pub fn scan_timeout(&self) -> Option<Duration> {
        self.scan_timeout_secs.map(Duration::from_secs)
    }

    /// Compile the ignore patterns.
    pub fn ignore_matcher(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.ignore_patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| ConfigError::new(format!("Invalid ignore pattern '{pattern}': {e}")))?;
            builder.add(glob);
        }
        builder.build().map_err(|e| ConfigError::new(e.to_string()))
    }

    /// Classify a path by its extension (ASCII case-insensitive).
    pub fn classify(&self, path: &Path) -> FileKind {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return FileKind::Unclassified;
        };
        let matches = |list: &[String]| list.iter().any(|e| e.eq_ignore_ascii_case(ext));

        if matches(&self.text_extensions) {
            FileKind::Text
        } else if matches(&self.image_extensions) {
            FileKind::Image
        } else if matches(&self.program_extensions) {
            FileKind::Program
        } else {
            FileKind::Unclassified
        }
    }

    /// Check if hidden files should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
