//! The main polling loop.
//!
//! The watcher owns every collaborator explicitly (no ambient globals):
//! the directory source, the change tracker, the OCR engine, and the
//! output sink. Each cycle scans the directory, classifies the listing,
//! and runs new items through recognize -> normalize -> deliver, strictly
//! one at a time. A deliberately longer pause follows each successful
//! recognition so a burst of images does not hammer the engine or the
//! clipboard.

use crate::config::Config;
use crate::dedup::DuplicateFilter;
use crate::engine::OcrEngine;
use crate::normalize::normalize;
use crate::sink::OutputSink;
use crate::source::{self, DirectorySource};
use crate::tracker::ChangeTracker;
use crate::types::{PathKey, RecognitionResult, WatchError};
use image::DynamicImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Sequential poll-and-dispatch loop.
pub struct Watcher {
    source: DirectorySource,
    tracker: ChangeTracker,
    engine: Box<dyn OcrEngine>,
    sink: Box<dyn OutputSink>,
    dup_filter: Option<DuplicateFilter>,
    evict_missing: bool,
    poll_interval: Duration,
    paced_interval: Duration,
    running: Arc<AtomicBool>,
}

impl Watcher {
    pub fn new(
        config: &Config,
        source: DirectorySource,
        engine: Box<dyn OcrEngine>,
        sink: Box<dyn OutputSink>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let dup_filter = config
            .dedup
            .enabled
            .then(|| DuplicateFilter::new(config.dedup.hash_threshold));

        Self {
            source,
            tracker: ChangeTracker::new(),
            engine,
            sink,
            dup_filter,
            evict_missing: config.watch.evict_missing,
            poll_interval: config.poll_interval(),
            paced_interval: config.paced_interval(),
            running,
        }
    }

    /// Seed the tracker with the current directory contents. Anything
    /// already present is assumed handled and is never processed.
    pub fn baseline(&mut self) -> Result<(), WatchError> {
        let listing = self.source.scan()?;
        source::log_baseline(self.source.root(), listing.len());
        self.tracker.baseline(listing);
        Ok(())
    }

    /// Run one poll cycle; returns the number of recognitions performed.
    ///
    /// Transient input problems (pending items, undecodable files) skip
    /// the item and continue. Engine and file-delivery failures propagate.
    pub async fn tick(&mut self) -> Result<u32, WatchError> {
        let listing = self.source.scan()?;
        if self.evict_missing {
            self.tracker.evict_missing(&listing);
        }
        let fresh = self.tracker.classify(listing);

        let mut recognized = 0;
        for key in fresh {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            if self.source.is_pending(&key) {
                debug!("skipping in-progress item {}", key.as_path().display());
                continue;
            }

            let image = match self.source.load(&key) {
                Some(img) => img,
                None => continue,
            };

            if let Some(filter) = self.dup_filter.as_mut() {
                if filter.is_duplicate(&image) {
                    debug!("skipping duplicate frame {}", key.as_path().display());
                    continue;
                }
            }

            let result = self.recognize(key, &image).await?;
            info!("took {:.02}s: {}", result.duration.as_secs_f64(), result.text);
            self.sink.deliver(&result.text).await?;
            recognized += 1;

            // Recognition is the expensive step; pause longer after real
            // work so bursts are throttled without a queue.
            self.sleep_while_running(self.paced_interval).await;
        }

        Ok(recognized)
    }

    /// Baseline the directory and run exactly one poll cycle, then stop.
    ///
    /// Scriptable smoke run: directory wiring, engine invocation, and
    /// delivery are all exercised without entering the endless loop.
    /// Returns the number of recognitions performed in that cycle.
    pub async fn run_once(&mut self) -> Result<u32, WatchError> {
        self.baseline()?;
        self.tick().await
    }

    /// Poll until the shutdown flag clears. There is no state to flush on
    /// exit: the seen set is disposable by design.
    pub async fn run(&mut self) -> Result<(), WatchError> {
        self.baseline()?;

        while self.running.load(Ordering::SeqCst) {
            self.tick().await?;
            self.sleep_while_running(self.poll_interval).await;
        }

        info!(
            "watch loop stopped ({} identities observed)",
            self.tracker.seen_count()
        );
        Ok(())
    }

    async fn recognize(
        &mut self,
        key: PathKey,
        image: &DynamicImage,
    ) -> Result<RecognitionResult, WatchError> {
        let started = Instant::now();
        let raw_text = self.engine.infer(image).await?;
        let duration = started.elapsed();
        let text = normalize(&raw_text);

        Ok(RecognitionResult {
            key,
            raw_text,
            text,
            duration,
            timestamp: chrono::Utc::now(),
        })
    }

    async fn sleep_while_running(&self, duration: Duration) {
        if self.running.load(Ordering::SeqCst) {
            tokio::time::sleep(duration).await;
        }
    }
}
