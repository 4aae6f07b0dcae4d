//! Configuration management.
//!
//! Loads configuration from a TOML file with full runtime defaults; every
//! field can also be overridden from the command line. The configuration
//! is immutable for the life of one run.

use crate::sink::DEFAULT_CLIPBOARD_COMMAND;
use crate::source::DEFAULT_PENDING_PREFIX;
use crate::types::WatchError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub clipboard: ClipboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directory to poll for new images.
    ///
    /// Always treated as a filesystem path; the historical literal
    /// "clipboard" simply names a directory called `clipboard`.
    /// Clipboard-as-input is not implemented.
    #[serde(default = "default_read_from")]
    pub read_from: String,

    /// Output target: the literal "clipboard" or a path to a .txt file
    #[serde(default = "default_write_to")]
    pub write_to: String,

    /// Poll interval in seconds
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,

    /// Multiplier applied to the poll interval after a successful
    /// recognition, throttling bursts without a queue
    #[serde(default = "default_pacing_factor")]
    pub pacing_factor: f64,

    /// Filename prefix marking an item as still being written
    #[serde(default = "default_pending_prefix")]
    pub pending_prefix: String,

    /// Drop seen keys for items no longer present in the directory.
    /// Bounds memory growth; documented deviation from reference behavior.
    #[serde(default)]
    pub evict_missing: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            read_from: default_read_from(),
            write_to: default_write_to(),
            delay_secs: default_delay_secs(),
            pacing_factor: default_pacing_factor(),
            pending_prefix: default_pending_prefix(),
            evict_missing: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Skip frames visually identical to the previously delivered one
    #[serde(default)]
    pub enabled: bool,

    /// Hamming distance at or below which frames count as identical
    #[serde(default)]
    pub hash_threshold: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the OCR binary; empty means probe default locations
    #[serde(default)]
    pub binary_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipboardConfig {
    /// External command invoked with the recognized text as sole argument
    #[serde(default = "default_clipboard_command")]
    pub command: String,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            command: default_clipboard_command(),
        }
    }
}

// Default value functions for serde
fn default_log_level() -> String {
    "info".to_string()
}

fn default_read_from() -> String {
    "clipboard".to_string()
}

fn default_write_to() -> String {
    "clipboard".to_string()
}

fn default_delay_secs() -> f64 {
    1.0
}

fn default_pacing_factor() -> f64 {
    5.0
}

fn default_pending_prefix() -> String {
    DEFAULT_PENDING_PREFIX.to_string()
}

fn default_clipboard_command() -> String {
    DEFAULT_CLIPBOARD_COMMAND.to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ocr-watch")
            .join("config.toml")
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: PathBuf) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        std::fs::write(&path, contents)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Reject invalid settings before the loop starts.
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.watch.delay_secs <= 0.0 || !self.watch.delay_secs.is_finite() {
            return Err(WatchError::Config(format!(
                "delay_secs must be a positive number, got {}",
                self.watch.delay_secs
            )));
        }
        if self.watch.pacing_factor < 1.0 || !self.watch.pacing_factor.is_finite() {
            return Err(WatchError::Config(format!(
                "pacing_factor must be >= 1.0, got {}",
                self.watch.pacing_factor
            )));
        }
        if self.watch.write_to != "clipboard"
            && PathBuf::from(&self.watch.write_to)
                .extension()
                .and_then(|e| e.to_str())
                != Some("txt")
        {
            return Err(WatchError::Config(format!(
                "write_to must be either \"clipboard\" or a path to a .txt file, got {}",
                self.watch.write_to
            )));
        }
        Ok(())
    }

    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.watch.delay_secs)
    }

    /// Extended pause inserted after a successful recognition.
    pub fn paced_interval(&self) -> Duration {
        Duration::from_secs_f64(self.watch.delay_secs * self.watch.pacing_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.watch.read_from, "clipboard");
        assert_eq!(config.watch.write_to, "clipboard");
        assert_eq!(config.watch.delay_secs, 1.0);
        assert_eq!(config.watch.pacing_factor, 5.0);
        assert_eq!(config.watch.pending_prefix, ".pending-");
        assert!(!config.dedup.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[general]
log_level = "debug"

[watch]
read_from = "/data/incoming"
write_to = "/data/out.txt"
delay_secs = 0.5

[dedup]
enabled = true
hash_threshold = 4
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.watch.read_from, "/data/incoming");
        assert_eq!(config.watch.write_to, "/data/out.txt");
        assert_eq!(config.watch.delay_secs, 0.5);
        assert!(config.dedup.enabled);
        assert_eq!(config.dedup.hash_threshold, 4);
        // Untouched sections keep their defaults.
        assert_eq!(config.watch.pacing_factor, 5.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_write_target() {
        let mut config = Config::default();
        config.watch.write_to = "/data/out.csv".to_string();
        assert!(matches!(config.validate(), Err(WatchError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_timing() {
        let mut config = Config::default();
        config.watch.delay_secs = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.watch.pacing_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_paced_interval() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.paced_interval(), Duration::from_secs(5));
    }
}
