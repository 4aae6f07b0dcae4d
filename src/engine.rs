//! OCR engine boundary.
//!
//! The engine is an external collaborator: this crate only depends on the
//! `infer` capability, taking a decoded bitmap and returning the raw
//! recognized string. The concrete implementation shells out to an OCR
//! binary; any failure there is treated as fatal to the run (engine
//! failures are assumed rare, e.g. out-of-resources, and are not retried).

use crate::types::WatchError;
use image::DynamicImage;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error};

/// Image-to-text inference capability.
///
/// Implementations take a decoded bitmap only; resolving paths to images
/// is the caller's job, never the engine's.
#[async_trait::async_trait]
pub trait OcrEngine: Send {
    async fn infer(&self, image: &DynamicImage) -> Result<String, WatchError>;
}

/// Counter for unique temp file names across calls.
static INFER_SEQ: AtomicU64 = AtomicU64::new(0);

/// OCR engine backed by an external command.
///
/// The command is invoked as `<binary> --image <path> --json` and is
/// expected to print a JSON object with a `text` field (or an `error`
/// field) on stdout.
pub struct CommandOcrEngine {
    binary_path: PathBuf,
}

impl CommandOcrEngine {
    /// Create an engine using the given binary, or the first binary found
    /// in the default probe locations when `binary` is `None`.
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self {
            binary_path: binary.unwrap_or_else(Self::default_binary_path),
        }
    }

    /// Probe the usual locations for the OCR binary.
    fn default_binary_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        let candidates = [
            exe_dir.join("manga-ocr"),
            PathBuf::from("/usr/local/bin/manga-ocr"),
            PathBuf::from("/usr/bin/manga-ocr"),
        ];

        for path in candidates {
            if path.exists() {
                return path;
            }
        }

        // Fall back to PATH lookup at invocation time.
        PathBuf::from("manga-ocr")
    }

    /// Whether the configured binary exists on disk. A bare command name
    /// is reported available and left to PATH resolution.
    pub fn is_available(&self) -> bool {
        if self.binary_path.components().count() <= 1 {
            return true;
        }
        let exists = self.binary_path.exists();
        if !exists {
            debug!("OCR binary not found at {}", self.binary_path.display());
        }
        exists
    }

    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }
}

#[async_trait::async_trait]
impl OcrEngine for CommandOcrEngine {
    async fn infer(&self, image: &DynamicImage) -> Result<String, WatchError> {
        let seq = INFER_SEQ.fetch_add(1, Ordering::Relaxed);
        let temp_path = std::env::temp_dir().join(format!(
            "ocr-watch-{}-{}.png",
            std::process::id(),
            seq
        ));

        image
            .save(&temp_path)
            .map_err(|e| WatchError::Engine(format!("failed to stage image: {}", e)))?;

        let result = run_ocr_command(&self.binary_path, &temp_path).await;
        let _ = std::fs::remove_file(&temp_path);
        result
    }
}

async fn run_ocr_command(binary: &PathBuf, image_path: &PathBuf) -> Result<String, WatchError> {
    let output = tokio::process::Command::new(binary)
        .arg("--image")
        .arg(image_path)
        .arg("--json")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| WatchError::Engine(format!("failed to run {}: {}", binary.display(), e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("OCR command failed: {}", stderr);
        return Err(WatchError::Engine(stderr.trim().to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout)
        .map_err(|e| WatchError::Engine(format!("unparseable engine output: {} - raw: {}", e, stdout)))?;

    if let Some(err) = parsed["error"].as_str() {
        return Err(WatchError::Engine(err.to_string()));
    }

    Ok(parsed["text"].as_str().unwrap_or("").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_command_is_available() {
        let engine = CommandOcrEngine::new(Some(PathBuf::from("manga-ocr")));
        assert!(engine.is_available());
    }

    #[test]
    fn test_missing_absolute_binary_unavailable() {
        let engine = CommandOcrEngine::new(Some(PathBuf::from("/no/such/place/manga-ocr")));
        assert!(!engine.is_available());
    }

    #[tokio::test]
    async fn test_infer_with_missing_binary_is_engine_error() {
        let engine = CommandOcrEngine::new(Some(PathBuf::from("/no/such/place/manga-ocr")));
        let image = DynamicImage::new_rgb8(2, 2);
        let err = engine.infer(&image).await.unwrap_err();
        assert!(matches!(err, WatchError::Engine(_)));
    }
}
