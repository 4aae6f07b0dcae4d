//! Output sinks for recognized text.
//!
//! Two variants behind one trait: a clipboard writer that shells out to a
//! synchronous clipboard-set command, and an append-only text file. The
//! variant is picked from configuration before the loop starts; an
//! invalid file target is rejected at construction, not at delivery.

use crate::types::WatchError;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Default external command used by the clipboard sink. The normalized
/// text is passed as the command's sole argument.
pub const DEFAULT_CLIPBOARD_COMMAND: &str = "termux-clipboard-set";

/// Destination for normalized recognition output.
#[async_trait::async_trait]
pub trait OutputSink: Send {
    /// Persist one recognized string.
    async fn deliver(&mut self, text: &str) -> Result<(), WatchError>;

    /// Human-readable description for startup logging.
    fn describe(&self) -> String;
}

/// Hands text to an external clipboard-set command.
///
/// Fire-and-forget: the command's exit status is not checked, and a spawn
/// failure is logged but does not stop the loop. This core has no way to
/// verify a clipboard write anyway.
pub struct ClipboardSink {
    command: String,
}

impl ClipboardSink {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait::async_trait]
impl OutputSink for ClipboardSink {
    async fn deliver(&mut self, text: &str) -> Result<(), WatchError> {
        match tokio::process::Command::new(&self.command)
            .arg(text)
            .output()
            .await
        {
            Ok(output) => {
                debug!("clipboard command exited with {}", output.status);
            }
            Err(e) => {
                warn!("clipboard command {:?} failed to run: {}", self.command, e);
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("clipboard (via {})", self.command)
    }
}

/// Appends one line per recognition to a UTF-8 text file.
///
/// The file is opened in append mode on every delivery and never
/// truncated or rewritten. Delivery I/O failures propagate and terminate
/// the run.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a sink targeting `path`. Anything without a `.txt`
    /// extension is a configuration error, raised here so the operator
    /// finds out before the loop starts.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, WatchError> {
        let path = path.into();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            return Err(WatchError::Config(format!(
                "write_to must be either \"clipboard\" or a path to a .txt file, got {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }
}

#[async_trait::async_trait]
impl OutputSink for FileSink {
    async fn deliver(&mut self, text: &str) -> Result<(), WatchError> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| WatchError::Delivery(format!("open {}: {}", self.path.display(), e)))?;
        writeln!(file, "{}", text)
            .map_err(|e| WatchError::Delivery(format!("append {}: {}", self.path.display(), e)))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Build the configured sink: the literal `"clipboard"` token selects the
/// clipboard variant, anything else is taken as a text file path.
pub fn make_sink(target: &str, clipboard_command: &str) -> Result<Box<dyn OutputSink>, WatchError> {
    if target == "clipboard" {
        Ok(Box::new(ClipboardSink::new(clipboard_command)))
    } else {
        Ok(Box::new(FileSink::new(target)?))
    }
}
