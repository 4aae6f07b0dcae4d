//! Change tracking over directory listings.
//!
//! The tracker owns the set of previously observed identity keys and
//! splits each poll's listing into new vs. already seen. It knows nothing
//! about the filesystem: identity is the (path, mtime) key computed by
//! the source, so a rewritten file shows up as a brand-new identity.

use crate::types::PathKey;
use std::collections::HashSet;
use tracing::debug;

/// Tracks which identity keys have already been observed.
///
/// The seen set only grows during a run (unless eviction is explicitly
/// enabled) and is never persisted: a restart re-baselines from the live
/// listing.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    seen: HashSet<PathKey>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the seen set with the startup listing so pre-existing items
    /// are never processed. Called exactly once, before the first poll.
    pub fn baseline(&mut self, listing: Vec<PathKey>) {
        debug!("baseline: seeding {} existing item(s)", listing.len());
        self.seen.extend(listing);
    }

    /// Return the keys in `listing` not seen before, in listing order,
    /// and mark the full listing as seen before returning.
    ///
    /// Marking everything up front means a slow consumer of the returned
    /// subset cannot cause re-delivery on the next poll: each key is
    /// returned as new at most once for the process lifetime.
    pub fn classify(&mut self, listing: Vec<PathKey>) -> Vec<PathKey> {
        let mut fresh = Vec::new();
        for key in listing {
            if self.seen.insert(key.clone()) {
                fresh.push(key);
            }
        }
        fresh
    }

    /// Mark a single key as seen without classifying a listing.
    pub fn mark_seen(&mut self, key: PathKey) {
        self.seen.insert(key);
    }

    /// Drop seen keys that are absent from the live listing.
    ///
    /// Optional deviation from the reference behavior (which lets the set
    /// grow unboundedly): bounds memory on high-churn directories at the
    /// cost of re-delivering an item that disappears and later reappears
    /// with an identical mtime. Only called when explicitly enabled.
    pub fn evict_missing(&mut self, listing: &[PathKey]) {
        let live: HashSet<&PathKey> = listing.iter().collect();
        let before = self.seen.len();
        self.seen.retain(|key| live.contains(key));
        let dropped = before - self.seen.len();
        if dropped > 0 {
            debug!("evicted {} stale key(s)", dropped);
        }
    }

    /// Number of distinct identities observed so far.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn key(name: &str, secs: u64) -> PathKey {
        PathKey::new(
            format!("/in/{name}"),
            SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        )
    }

    #[test]
    fn test_baseline_items_never_new() {
        let mut tracker = ChangeTracker::new();
        tracker.baseline(vec![key("a.png", 1)]);

        let fresh = tracker.classify(vec![key("a.png", 1)]);
        assert!(fresh.is_empty());
    }

    #[test]
    fn test_at_most_once_delivery() {
        let mut tracker = ChangeTracker::new();
        tracker.baseline(vec![]);

        let fresh = tracker.classify(vec![key("b.png", 2)]);
        assert_eq!(fresh, vec![key("b.png", 2)]);

        // Same listing again: already marked, even though it is still present.
        for _ in 0..3 {
            assert!(tracker.classify(vec![key("b.png", 2)]).is_empty());
        }
    }

    #[test]
    fn test_rewrite_is_new_identity() {
        // Scenario: baseline {a@t1}; poll 1 adds b@t2; poll 2 rewrites a (t1 -> t3).
        let mut tracker = ChangeTracker::new();
        tracker.baseline(vec![key("a.png", 1)]);

        let poll1 = tracker.classify(vec![key("a.png", 1), key("b.png", 2)]);
        assert_eq!(poll1, vec![key("b.png", 2)]);

        let poll2 = tracker.classify(vec![key("a.png", 3), key("b.png", 2)]);
        assert_eq!(poll2, vec![key("a.png", 3)]);
    }

    #[test]
    fn test_listing_order_preserved() {
        let mut tracker = ChangeTracker::new();
        let listing = vec![key("z.png", 5), key("a.png", 6), key("m.png", 7)];
        assert_eq!(tracker.classify(listing.clone()), listing);
    }

    #[test]
    fn test_mark_seen_skips_later_classify() {
        let mut tracker = ChangeTracker::new();
        tracker.mark_seen(key("c.png", 9));
        assert!(tracker.classify(vec![key("c.png", 9)]).is_empty());
    }

    #[test]
    fn test_evict_missing() {
        let mut tracker = ChangeTracker::new();
        tracker.baseline(vec![key("a.png", 1), key("b.png", 2)]);
        assert_eq!(tracker.seen_count(), 2);

        tracker.evict_missing(&[key("b.png", 2)]);
        assert_eq!(tracker.seen_count(), 1);

        // The evicted key counts as new if it reappears unchanged.
        let fresh = tracker.classify(vec![key("a.png", 1), key("b.png", 2)]);
        assert_eq!(fresh, vec![key("a.png", 1)]);
    }
}
