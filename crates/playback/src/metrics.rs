//! Playback counters.
//!
//! Each event is recorded twice: in local atomics, readable through
//! [`PlaybackMetrics::snapshot`], and through the `metrics` facade for
//! whichever recorder the host installs.

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;
use serde::Serialize;

#[derive(Debug, Default)]
pub struct PlaybackMetrics {
    dispatched: AtomicU64,
    applied: AtomicU64,
    stale: AtomicU64,
    errors: AtomicU64,
    cache_hits: AtomicU64,
}

impl PlaybackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame load was requested.
    pub fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        counter!("radar_frames_dispatched_total").increment(1);
    }

    /// Decoded geometry became visible.
    pub fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
        counter!("radar_frames_applied_total").increment(1);
    }

    /// A superseded result arrived and was dropped.
    pub fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
        counter!("radar_stale_results_total").increment(1);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        counter!("radar_frame_errors_total").increment(1);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        counter!("radar_frame_cache_hits_total").increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub dispatched: u64,
    pub applied: u64,
    pub stale: u64,
    pub errors: u64,
    pub cache_hits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = PlaybackMetrics::new();
        metrics.record_dispatch();
        metrics.record_dispatch();
        metrics.record_applied();
        metrics.record_stale();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dispatched, 2);
        assert_eq!(snapshot.applied, 1);
        assert_eq!(snapshot.stale, 1);
        assert_eq!(snapshot.errors, 0);
    }
}
