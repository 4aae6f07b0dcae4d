//! Core types used throughout the watcher.
//!
//! This module defines the identity key used for change detection, the
//! per-recognition result record, and the crate-wide error type.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Identity of one observed input item, computed without reading content.
///
/// Two scans of the same unchanged file produce an identical key; any
/// rewrite that bumps the modification timestamp produces a new one.
/// Keys are recomputed fresh on every poll and never persisted across
/// process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey {
    /// Absolute or root-relative path of the item
    pub path: PathBuf,
    /// Last-modification timestamp (lstat semantics, coarsest available)
    pub mtime: SystemTime,
}

impl PathKey {
    pub fn new(path: impl Into<PathBuf>, mtime: SystemTime) -> Self {
        Self {
            path: path.into(),
            mtime,
        }
    }

    /// The final path component, used for the in-progress prefix check.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

/// Result of one successful recognition. Ephemeral: produced by the
/// watcher, consumed by logging and delivery, never retained.
#[derive(Debug, Clone)]
pub struct RecognitionResult {
    /// Identity of the source item
    pub key: PathKey,
    /// Raw decoded string as emitted by the OCR engine
    pub raw_text: String,
    /// Normalized display string actually delivered
    pub text: String,
    /// Wall-clock time spent inside the engine call
    pub duration: Duration,
    /// When the recognition completed
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Errors that can terminate a watch run.
///
/// Transient input problems (unreadable or partially written images)
/// never surface here: the source swallows them and the item is skipped.
/// Everything downstream of a successful load fails loudly.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("OCR engine failure: {0}")]
    Engine(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_key_identity() {
        let t = SystemTime::UNIX_EPOCH;
        let a = PathKey::new("/in/a.png", t);
        let b = PathKey::new("/in/a.png", t);
        assert_eq!(a, b);

        let later = t + Duration::from_secs(1);
        let rewritten = PathKey::new("/in/a.png", later);
        assert_ne!(a, rewritten);
    }

    #[test]
    fn test_path_key_file_name() {
        let key = PathKey::new("/in/.pending-shot.png", SystemTime::UNIX_EPOCH);
        assert_eq!(key.file_name(), ".pending-shot.png");
    }
}
