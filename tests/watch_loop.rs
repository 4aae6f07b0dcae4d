//! End-to-end tests for the poll-recognize-deliver pipeline.
//!
//! These drive the public API with a real watched directory and a real
//! file sink, substituting only the OCR engine (a canned-text stub), and
//! verify the delivery guarantees across multiple poll cycles.

use image::DynamicImage;
use ocr_watch::{
    Config, DirectorySource, FileSink, OcrEngine, WatchError, Watcher,
};
use std::fs::File;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Engine stub returning a fixed raw string, pre-normalization.
struct CannedEngine(&'static str);

#[async_trait::async_trait]
impl OcrEngine for CannedEngine {
    async fn infer(&self, _image: &DynamicImage) -> Result<String, WatchError> {
        Ok(self.0.to_string())
    }
}

fn write_png(path: &Path, mtime_secs: u64) {
    image::RgbImage::new(8, 8).save(path).unwrap();
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs))
        .unwrap();
}

fn make_watcher(root: &Path, out: &Path, raw: &'static str) -> Watcher {
    let mut config = Config::default();
    config.watch.delay_secs = 0.001;

    let source = DirectorySource::new(root, ".pending-").unwrap();
    let sink = Box::new(FileSink::new(out).unwrap());
    let running = Arc::new(AtomicBool::new(true));

    Watcher::new(&config, source, Box::new(CannedEngine(raw)), sink, running)
}

#[tokio::test]
async fn recognized_text_is_normalized_and_appended() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("incoming");
    let out = dir.path().join("out.txt");

    let mut watcher = make_watcher(&root, &out, "ﾃｽﾄ ABC…:。・123");
    watcher.baseline().unwrap();

    write_png(&root.join("page.png"), 100);
    assert_eq!(watcher.tick().await.unwrap(), 1);

    let contents = std::fs::read_to_string(&out).unwrap();
    assert_eq!(contents, "テストＡＢＣ１２３\n");
}

#[tokio::test]
async fn each_image_appends_one_line_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("incoming");
    let out = dir.path().join("out.txt");

    let mut watcher = make_watcher(&root, &out, "ページ");
    watcher.baseline().unwrap();

    write_png(&root.join("a.png"), 100);
    assert_eq!(watcher.tick().await.unwrap(), 1);

    write_png(&root.join("b.png"), 200);
    write_png(&root.join("c.png"), 300);
    assert_eq!(watcher.tick().await.unwrap(), 2);

    let contents = std::fs::read_to_string(&out).unwrap();
    assert_eq!(contents.lines().count(), 3);
    assert!(contents.lines().all(|line| line == "ページ"));

    // Nothing new: the file is appended to, never rewritten.
    assert_eq!(watcher.tick().await.unwrap(), 0);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), contents);
}

#[tokio::test]
async fn missing_watch_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("does/not/exist/yet");

    let mut watcher = make_watcher(&root, &dir.path().join("out.txt"), "x");
    watcher.baseline().unwrap();

    assert!(root.is_dir());
    assert_eq!(watcher.tick().await.unwrap(), 0);
}

#[tokio::test]
async fn mixed_listing_processes_only_eligible_items() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("incoming");
    let out = dir.path().join("out.txt");

    let mut watcher = make_watcher(&root, &out, "本文");
    watcher.baseline().unwrap();

    write_png(&root.join("good.png"), 100);
    write_png(&root.join(".pending-half.png"), 101);
    std::fs::write(root.join("broken.png"), b"not an image").unwrap();

    assert_eq!(watcher.tick().await.unwrap(), 1);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "本文\n");

    // The skipped items were marked seen: no re-processing later.
    assert_eq!(watcher.tick().await.unwrap(), 0);
}
