//! Synchronous playback state machine.
//!
//! [`PlaybackSession`] decides *what* should be loaded and *whether* a
//! finished load may still be shown. It performs no I/O and owns no timers;
//! the caller passes in the current instant and drives ticks and throttle
//! expiry. [`PlaybackController`](crate::controller::PlaybackController)
//! is the async driver around it.
//!
//! Every dispatch takes a fresh request generation. A result is applied only
//! while its generation is still the latest and its epoch is current, so
//! late arrivals from superseded requests are dropped without side effects.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::throttle::TrailingThrottle;
use crate::timeline::{Frame, Timeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    Stopped,
    Playing,
    Scrubbing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackState {
    pub current_index: usize,
    pub mode: PlaybackMode,
    pub request_generation: u64,
}

/// A request to load one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub index: usize,
    pub generation: u64,
    pub epoch: u64,
    pub frame: Frame,
}

pub struct PlaybackSession {
    timeline: Timeline,
    state: PlaybackState,
    throttle: TrailingThrottle<usize>,
}

impl PlaybackSession {
    /// An empty, stopped session.
    pub fn new(scrub_throttle: Duration) -> Self {
        Self {
            timeline: Timeline::empty(),
            state: PlaybackState {
                current_index: 0,
                mode: PlaybackMode::Stopped,
                request_generation: 0,
            },
            throttle: TrailingThrottle::new(scrub_throttle),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn mode(&self) -> PlaybackMode {
        self.state.mode
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn generation(&self) -> u64 {
        self.state.request_generation
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn epoch(&self) -> u64 {
        self.timeline.epoch()
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.timeline.at(self.state.current_index)
    }

    /// Start autoplay. Returns `false` if nothing changed.
    ///
    /// A scrub still waiting on the throttle is dropped; the next tick takes
    /// over from the scrubbed position.
    pub fn play(&mut self) -> bool {
        if self.state.mode == PlaybackMode::Playing || self.timeline.is_empty() {
            return false;
        }
        self.throttle.cancel();
        self.state.mode = PlaybackMode::Playing;
        true
    }

    /// Stop autoplay. A pending scrub still fires.
    pub fn pause(&mut self) -> bool {
        if self.state.mode == PlaybackMode::Stopped {
            return false;
        }
        self.state.mode = PlaybackMode::Stopped;
        true
    }

    /// Move to `index` (clamped to the timeline) and schedule a throttled
    /// load. Outstanding requests are invalidated at once.
    ///
    /// Returns the index actually selected, or `None` on an empty timeline.
    pub fn scrub(&mut self, index: usize, now: Instant) -> Option<usize> {
        let last = self.timeline.latest_index()?;
        let index = index.min(last);

        self.state.mode = PlaybackMode::Scrubbing;
        self.state.current_index = index;
        self.state.request_generation += 1;

        let deadline = self.throttle.offer(index, now);
        debug!(
            index = index,
            generation = self.state.request_generation,
            deadline_ms = deadline.saturating_duration_since(now).as_millis() as u64,
            "Scrub scheduled"
        );
        Some(index)
    }

    /// Scrub to the frame nearest `timestamp`.
    pub fn scrub_to_timestamp(&mut self, timestamp: i64, now: Instant) -> Option<usize> {
        let index = self.timeline.nearest_index_for_timestamp(timestamp)?;
        self.scrub(index, now)
    }

    /// When the pending scrub dispatch is due.
    pub fn throttle_deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    /// Release the pending scrub dispatch if its window has closed.
    pub fn flush_scrub(&mut self, now: Instant) -> Option<Dispatch> {
        let index = self.throttle.poll_expired(now)?;
        self.dispatch(index)
    }

    /// Advance one frame while playing, wrapping at the end.
    pub fn tick(&mut self) -> Option<Dispatch> {
        if self.state.mode != PlaybackMode::Playing || self.timeline.is_empty() {
            return None;
        }
        self.state.current_index = (self.state.current_index + 1) % self.timeline.len();
        self.dispatch(self.state.current_index)
    }

    /// Swap in a new epoch.
    ///
    /// Outstanding requests and any pending scrub are invalidated. A
    /// non-empty epoch starts playing from its latest frame, which is
    /// dispatched; an empty one leaves the session stopped.
    pub fn replace_epoch(&mut self, frames: Vec<Frame>) -> Option<Dispatch> {
        self.timeline = self.timeline.replace_epoch(frames);
        self.throttle.cancel();
        self.state.request_generation += 1;

        match self.timeline.latest_index() {
            Some(last) => {
                self.state.current_index = last;
                self.state.mode = PlaybackMode::Playing;
                self.dispatch(last)
            }
            None => {
                self.state.current_index = 0;
                self.state.mode = PlaybackMode::Stopped;
                None
            }
        }
    }

    /// Whether a result for `generation` in `epoch` may still be applied.
    pub fn is_current(&self, generation: u64, epoch: u64) -> bool {
        generation == self.state.request_generation && epoch == self.timeline.epoch()
    }

    fn dispatch(&mut self, index: usize) -> Option<Dispatch> {
        let frame = self.timeline.at(index)?.clone();
        self.state.request_generation += 1;
        Some(Dispatch {
            index,
            generation: self.state.request_generation,
            epoch: self.timeline.epoch(),
            frame,
        })
    }
}
