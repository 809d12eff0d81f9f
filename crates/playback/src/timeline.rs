//! Immutable, ordered frame timelines.

use std::sync::Arc;

use tracing::warn;

use crate::manifest::Manifest;

/// Descriptor of one frame. Geometry is decoded lazily and cached
/// elsewhere, keyed on the frame's index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Unix seconds.
    pub timestamp: i64,
    pub reference: String,
}

impl Frame {
    pub fn new(timestamp: i64, reference: impl Into<String>) -> Self {
        Self {
            timestamp,
            reference: reference.into(),
        }
    }
}

/// One epoch of frames, ordered by non-decreasing timestamp.
///
/// Cloning is cheap; the frames are shared.
#[derive(Debug, Clone)]
pub struct Timeline {
    epoch: u64,
    frames: Arc<[Frame]>,
}

impl Timeline {
    /// Build the first epoch.
    ///
    /// Frames that are not in timestamp order are stable-sorted.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self::with_epoch(0, frames)
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn from_manifest(manifest: Manifest) -> Self {
        Self::new(frames_from_manifest(manifest))
    }

    fn with_epoch(epoch: u64, mut frames: Vec<Frame>) -> Self {
        if frames.windows(2).any(|w| w[0].timestamp > w[1].timestamp) {
            warn!(epoch = epoch, frames = frames.len(), "Timeline out of order, sorting by timestamp");
            frames.sort_by_key(|f| f.timestamp);
        }
        Self {
            epoch,
            frames: frames.into(),
        }
    }

    /// A new timeline for the next epoch. `self` is left untouched.
    pub fn replace_epoch(&self, frames: Vec<Frame>) -> Timeline {
        Self::with_epoch(self.epoch + 1, frames)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Index of the most recent frame.
    pub fn latest_index(&self) -> Option<usize> {
        self.frames.len().checked_sub(1)
    }

    /// Index of the frame closest in time to `timestamp`.
    ///
    /// Exact matches resolve to the first frame with that timestamp. Between
    /// two frames the closer wins, with ties going to the earlier one.
    pub fn nearest_index_for_timestamp(&self, timestamp: i64) -> Option<usize> {
        if self.frames.is_empty() {
            return None;
        }

        let upper = self.first_at_or_after(timestamp);
        if upper == self.frames.len() {
            return self.latest_index().map(|last| self.first_at_or_after(self.frames[last].timestamp));
        }
        if upper == 0 || self.frames[upper].timestamp == timestamp {
            return Some(upper);
        }

        let below = self.frames[upper - 1].timestamp;
        let above = self.frames[upper].timestamp;
        if timestamp.abs_diff(below) <= above.abs_diff(timestamp) {
            Some(self.first_at_or_after(below))
        } else {
            Some(upper)
        }
    }

    fn first_at_or_after(&self, timestamp: i64) -> usize {
        self.frames.partition_point(|f| f.timestamp < timestamp)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::empty()
    }
}

/// Convert manifest entries to frame descriptors.
pub fn frames_from_manifest(manifest: Manifest) -> Vec<Frame> {
    manifest
        .entries
        .into_iter()
        .map(|e| Frame::new(e.timestamp, e.reference))
        .collect()
}
