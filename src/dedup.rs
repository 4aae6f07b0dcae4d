//! Duplicate-frame suppression using perceptual hashing.
//!
//! Optional watcher feature (off by default): when a producer drops
//! several visually identical frames in a row, only the first is sent to
//! the engine. Comparison uses the average hash (aHash) of the decoded
//! image against the previously accepted frame, so no pixel-by-pixel
//! diff is needed.

use image::DynamicImage;
use tracing::trace;

/// Hash size (8x8 = 64 bits)
const HASH_SIZE: u32 = 8;

/// Perceptual hash value (64-bit)
pub type PerceptualHash = u64;

/// Suppresses consecutive visually identical frames.
pub struct DuplicateFilter {
    last_hash: Option<PerceptualHash>,
    /// Hamming distance at or below which a frame counts as a duplicate
    threshold: u32,
}

impl DuplicateFilter {
    pub fn new(threshold: u32) -> Self {
        Self {
            last_hash: None,
            threshold,
        }
    }

    /// Check whether `image` duplicates the previously accepted frame.
    ///
    /// A non-duplicate becomes the new comparison baseline; the first
    /// frame ever seen is never a duplicate.
    pub fn is_duplicate(&mut self, image: &DynamicImage) -> bool {
        let hash = compute_ahash(image);

        let duplicate = match self.last_hash {
            Some(prev) => {
                let distance = hamming_distance(hash, prev);
                trace!("frame hash distance {} (threshold {})", distance, self.threshold);
                distance <= self.threshold
            }
            None => false,
        };

        if !duplicate {
            self.last_hash = Some(hash);
        }
        duplicate
    }
}

/// Compute average hash (aHash) for an image
///
/// Algorithm:
/// 1. Resize to 8x8
/// 2. Convert to grayscale
/// 3. Calculate average brightness
/// 4. Generate 64-bit hash: bit=1 if pixel > average, else 0
pub fn compute_ahash(image: &DynamicImage) -> PerceptualHash {
    let resized = image.resize_exact(HASH_SIZE, HASH_SIZE, image::imageops::FilterType::Nearest);
    let gray = resized.to_luma8();

    let sum: u32 = gray.pixels().map(|p| p.0[0] as u32).sum();
    let avg = (sum / (HASH_SIZE * HASH_SIZE)) as u8;

    let mut hash: PerceptualHash = 0;
    for (i, pixel) in gray.pixels().enumerate() {
        if pixel.0[0] > avg {
            hash |= 1 << i;
        }
    }

    hash
}

/// Number of bits that differ between two hashes (0-64).
pub fn hamming_distance(a: PerceptualHash, b: PerceptualHash) -> u32 {
    (a ^ b).count_ones()
}
