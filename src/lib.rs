//! ocr-watch - background OCR for a watched directory
//!
//! This crate runs OCR in the background, waiting for new images to
//! appear in a watched directory and delivering the recognized text to
//! the system clipboard or an append-only text file:
//!
//! - **source**: directory polling with (path, mtime) identity keys
//! - **tracker**: seen-set change classification (at-most-once delivery)
//! - **engine**: external OCR command boundary
//! - **normalize**: whitespace/width/punctuation cleanup of raw text
//! - **sink**: clipboard-command or text-file delivery
//! - **watcher**: the sequential poll-recognize-deliver loop
//!
//! # Architecture
//!
//! One logical thread of control: each poll cycle classifies the current
//! directory listing against everything seen so far, then runs each new
//! decodable item through the engine, the normalizer, and the sink in
//! strict sequence, pacing itself with an extended pause after every
//! real recognition.

pub mod config;
pub mod dedup;
pub mod engine;
pub mod normalize;
pub mod sink;
pub mod source;
pub mod tracker;
pub mod types;
pub mod watcher;

// Re-export commonly used types
pub use config::Config;
pub use dedup::{compute_ahash, hamming_distance, DuplicateFilter, PerceptualHash};
pub use engine::{CommandOcrEngine, OcrEngine};
pub use normalize::normalize;
pub use sink::{make_sink, ClipboardSink, FileSink, OutputSink};
pub use source::DirectorySource;
pub use tracker::ChangeTracker;
pub use types::{PathKey, RecognitionResult, WatchError};
pub use watcher::Watcher;
