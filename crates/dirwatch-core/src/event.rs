//! Change events produced by comparing snapshots.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::Display;

/// What happened to a file between two scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// A single detected change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub name: CompactString,
}

impl ChangeEvent {
    pub fn added(name: impl Into<CompactString>) -> Self {
        Self {
            kind: ChangeKind::Added,
            name: name.into(),
        }
    }

    pub fn removed(name: impl Into<CompactString>) -> Self {
        Self {
            kind: ChangeKind::Removed,
            name: name.into(),
        }
    }

    pub fn modified(name: impl Into<CompactString>) -> Self {
        Self {
            kind: ChangeKind::Modified,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self.kind {
            ChangeKind::Added => "is added",
            ChangeKind::Removed => "is deleted",
            ChangeKind::Modified => "has been modified",
        };
        write!(f, "File '{}' {verb}.", self.name)
    }
}
