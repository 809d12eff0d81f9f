//! Trailing-edge throttle.
//!
//! The first offer opens a window. Later offers inside the window replace
//! the pending value. When the window closes the latest value is released
//! once, and the next offer opens a fresh window.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
pub struct TrailingThrottle<T> {
    window: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> TrailingThrottle<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
        }
    }

    /// Record `value` as the latest request. Returns when it will be released.
    pub fn offer(&mut self, value: T, now: Instant) -> Instant {
        self.pending = Some(value);
        *self.deadline.get_or_insert(now + self.window)
    }

    /// When the open window closes, if one is open.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending value if the window has closed by `now`.
    pub fn poll_expired(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Drop the pending value and close the window.
    pub fn cancel(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
