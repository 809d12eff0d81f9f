//! LRU cache for decoded frame geometry.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use radar_codec::ColorBand;
use serde::Serialize;

/// Decoded bands for one frame, shared with event consumers.
pub type FrameAreas = Arc<[ColorBand]>;

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub epoch: u64,
}

/// Decoded frames of the current epoch, keyed on frame index.
///
/// Indices are only meaningful within one epoch, so the whole cache is
/// dropped when the epoch changes.
pub struct FrameCache {
    cache: LruCache<usize, FrameAreas>,
    epoch: u64,
    hits: u64,
    misses: u64,
}

impl FrameCache {
    /// Create a cache holding at most `capacity` frames (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            epoch: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, index: usize) -> Option<FrameAreas> {
        if let Some(areas) = self.cache.get(&index) {
            self.hits += 1;
            Some(Arc::clone(areas))
        } else {
            self.misses += 1;
            None
        }
    }

    /// Insert decoded geometry. Results belonging to another epoch are ignored.
    pub fn insert(&mut self, epoch: u64, index: usize, areas: FrameAreas) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.cache.put(index, areas);
        true
    }

    /// Drop everything and start accepting entries for `epoch`.
    pub fn reset(&mut self, epoch: u64) {
        self.cache.clear();
        self.epoch = epoch;
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
            epoch: self.epoch,
        }
    }
}
