//! Directory-polling input source.
//!
//! The only supported input mode: a directory is scanned on every poll
//! and each entry is identified by its (path, mtime) key. Items still
//! being written are flagged by a filename prefix convention and skipped;
//! items that fail to decode as images are skipped silently. Neither is
//! fatal to the loop.

use crate::types::{PathKey, WatchError};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default filename prefix signaling a producer is still writing the file.
pub const DEFAULT_PENDING_PREFIX: &str = ".pending-";

/// Polls a single directory for new image files.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    pending_prefix: String,
}

impl DirectorySource {
    /// Open the source rooted at `root`, creating the directory if it
    /// does not exist yet so watching can begin immediately.
    pub fn new(root: impl Into<PathBuf>, pending_prefix: impl Into<String>) -> Result<Self, WatchError> {
        let root = root.into();
        if root.exists() {
            if !root.is_dir() {
                return Err(WatchError::Config(format!(
                    "read_from target {} exists and is not a directory",
                    root.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&root)?;
            info!("created watch directory {}", root.display());
        }

        Ok(Self {
            root,
            pending_prefix: pending_prefix.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List the current directory contents as identity keys, in the
    /// directory's natural enumeration order (not sorted by time).
    ///
    /// A failure to read the directory itself propagates; a failure to
    /// stat one entry only drops that entry for this cycle.
    pub fn scan(&self) -> Result<Vec<PathKey>, std::io::Error> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            // lstat, not stat: a dangling symlink still yields a stable key.
            let mtime = match std::fs::symlink_metadata(&path).and_then(|m| m.modified()) {
                Ok(t) => t,
                Err(e) => {
                    debug!("no mtime for {}: {}", path.display(), e);
                    continue;
                }
            };
            keys.push(PathKey::new(path, mtime));
        }
        Ok(keys)
    }

    /// Whether the item's file name carries the in-progress marker.
    ///
    /// Such items are recorded as seen but never passed to OCR under that
    /// name; if the producer later renames the file, the rename shows up
    /// as a new, distinct identity and becomes eligible.
    pub fn is_pending(&self, key: &PathKey) -> bool {
        key.file_name().starts_with(&self.pending_prefix)
    }

    /// Try to decode the item as an image.
    ///
    /// Any failure (corrupt data, wrong format, still-locked file) is a
    /// transient input condition: logged at debug level only, and the
    /// caller skips the item without retrying.
    pub fn load(&self, key: &PathKey) -> Option<DynamicImage> {
        match image::open(key.as_path()) {
            Ok(img) => Some(img),
            Err(e) => {
                debug!("skipping {}: {}", key.as_path().display(), e);
                None
            }
        }
    }
}

/// Log a startup warning when the watch directory is surprisingly large;
/// every pre-existing entry is baselined and will never be processed.
pub fn log_baseline(root: &Path, count: usize) {
    info!("reading from directory {}", root.display());
    if count > 10_000 {
        warn!(
            "{} pre-existing item(s) in {} are being baselined, not processed",
            count,
            root.display()
        );
    }
}
