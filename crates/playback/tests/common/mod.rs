//! Common test utilities for playback tests
//!
//! Provides helpers for:
//! - A scripted in-memory frame source with per-reference delays and failures
//! - Building timelines whose frames decode to distinguishable colours
//! - Spawning a controller and waiting for specific events

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use playback::{
    FetchError, Frame, FrameSource, PlaybackConfig, PlaybackController, PlaybackEvent,
    PlaybackHandle,
};
use radar_common::TimestampLabeler;
use test_utils::fixtures::{grid, time};
use test_utils::{diamond_shape, frame_reference, payload_json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Upper bound on waiting for a single event, in (paused) test time.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Clone)]
enum Behaviour {
    Respond { bytes: Bytes, delay: Duration },
    Fail(FetchError),
    FailAfter { error: FetchError, delay: Duration },
    FailThenRespond { remaining: u32, error: FetchError, bytes: Bytes },
    Hang,
    HangThenRespond { remaining: u32, bytes: Bytes },
}

/// In-memory [`FrameSource`] scripted per reference.
///
/// Unknown references fail with [`FetchError::NotFound`].
#[derive(Default)]
pub struct MockSource {
    behaviours: Mutex<HashMap<String, Behaviour>>,
    fetched: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, reference: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.respond_after(reference, bytes, Duration::ZERO)
    }

    pub fn respond_after(
        self,
        reference: impl Into<String>,
        bytes: impl Into<Bytes>,
        delay: Duration,
    ) -> Self {
        self.set(
            reference,
            Behaviour::Respond {
                bytes: bytes.into(),
                delay,
            },
        )
    }

    pub fn fail(self, reference: impl Into<String>, error: FetchError) -> Self {
        self.set(reference, Behaviour::Fail(error))
    }

    pub fn fail_times(
        self,
        reference: impl Into<String>,
        times: u32,
        error: FetchError,
        bytes: impl Into<Bytes>,
    ) -> Self {
        self.set(
            reference,
            Behaviour::FailThenRespond {
                remaining: times,
                error,
                bytes: bytes.into(),
            },
        )
    }

    pub fn fail_after(self, reference: impl Into<String>, error: FetchError, delay: Duration) -> Self {
        self.set(reference, Behaviour::FailAfter { error, delay })
    }

    pub fn hang(self, reference: impl Into<String>) -> Self {
        self.set(reference, Behaviour::Hang)
    }

    /// Never answer the first request, answer later ones with `bytes`.
    pub fn hang_once(self, reference: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.set(
            reference,
            Behaviour::HangThenRespond {
                remaining: 1,
                bytes: bytes.into(),
            },
        )
    }

    /// Every reference requested so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, reference: &str) -> usize {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == reference)
            .count()
    }

    fn set(self, reference: impl Into<String>, behaviour: Behaviour) -> Self {
        self.behaviours
            .lock()
            .unwrap()
            .insert(reference.into(), behaviour);
        self
    }
}

#[async_trait]
impl FrameSource for MockSource {
    async fn fetch(&self, reference: &str) -> Result<Bytes, FetchError> {
        self.fetched.lock().unwrap().push(reference.to_string());

        let behaviour = {
            let mut behaviours = self.behaviours.lock().unwrap();
            match behaviours.get_mut(reference) {
                Some(Behaviour::FailThenRespond {
                    remaining, error, ..
                }) if *remaining > 0 => {
                    *remaining -= 1;
                    Behaviour::Fail(error.clone())
                }
                Some(Behaviour::HangThenRespond { remaining, .. }) if *remaining > 0 => {
                    *remaining -= 1;
                    Behaviour::Hang
                }
                Some(behaviour) => behaviour.clone(),
                None => Behaviour::Fail(FetchError::NotFound(reference.to_string())),
            }
        };

        match behaviour {
            Behaviour::Respond { bytes, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(bytes)
            }
            Behaviour::FailThenRespond { bytes, .. } => Ok(bytes),
            Behaviour::HangThenRespond { bytes, .. } => Ok(bytes),
            Behaviour::Fail(error) => Err(error),
            Behaviour::FailAfter { error, delay } => {
                tokio::time::sleep(delay).await;
                Err(error)
            }
            Behaviour::Hang => std::future::pending().await,
        }
    }
}

// ============================================================================
// Timelines
// ============================================================================

/// Colour of the single band in frame `index`'s payload.
pub fn frame_color(prefix: &str, index: usize) -> String {
    let base = if prefix.is_empty() { 0 } else { 0x100 };
    format!("{:06x}", base + index + 1)
}

/// `count` frames five minutes apart, referenced as `<prefix>radar/...`.
pub fn frames(prefix: &str, count: usize) -> Vec<Frame> {
    (0..count)
        .map(|i| {
            let ts = time::REFERENCE_TS + i as i64 * time::FRAME_STEP_SECS;
            Frame::new(ts, format!("{}{}", prefix, frame_reference(ts)))
        })
        .collect()
}

/// Payload for frame `index`: one band with a diamond.
pub fn frame_payload(prefix: &str, index: usize) -> Vec<u8> {
    let color = frame_color(prefix, index);
    payload_json(&grid::METEOSWISS, &[(color.as_str(), vec![diamond_shape(300, 301)])])
}

/// Register a payload for every frame, all answered immediately.
pub fn with_frames(source: MockSource, prefix: &str, frames: &[Frame]) -> MockSource {
    frames.iter().enumerate().fold(source, |source, (i, frame)| {
        source.respond(frame.reference.clone(), frame_payload(prefix, i))
    })
}

// ============================================================================
// Controller
// ============================================================================

/// Deterministic config: 1 s ticks, 250 ms throttle, no retries.
pub fn test_config() -> PlaybackConfig {
    PlaybackConfig {
        max_retries: 0,
        ..Default::default()
    }
}

pub struct Harness {
    pub handle: PlaybackHandle,
    pub events: mpsc::Receiver<PlaybackEvent>,
    pub task: JoinHandle<()>,
    pub source: Arc<MockSource>,
}

/// Route controller logs to the test output. Set `RUST_LOG=playback=debug`
/// to see dispatch and discard decisions.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn spawn(source: MockSource, config: PlaybackConfig) -> Harness {
    init_tracing();
    let source = Arc::new(source);
    let (handle, events, task) = PlaybackController::spawn(
        source.clone(),
        config,
        Arc::new(TimestampLabeler::default()),
    )
    .expect("valid config");

    Harness {
        handle,
        events,
        task,
        source,
    }
}

impl Harness {
    /// Receive events until one matches, returning it and everything skipped.
    pub async fn wait_for<F>(&mut self, mut pred: F) -> (PlaybackEvent, Vec<PlaybackEvent>)
    where
        F: FnMut(&PlaybackEvent) -> bool,
    {
        let mut skipped = Vec::new();
        loop {
            let event = tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
                .await
                .expect("timed out waiting for event")
                .expect("event channel closed");
            if pred(&event) {
                return (event, skipped);
            }
            skipped.push(event);
        }
    }

    /// Wait for the next frame to become visible; returns its index and colour.
    pub async fn next_ready(&mut self) -> (usize, String) {
        let (event, _) = self.wait_for(|e| matches!(e, PlaybackEvent::FrameReady { .. })).await;
        match event {
            PlaybackEvent::FrameReady { index, areas, .. } => (index, areas[0].color_hex.clone()),
            _ => unreachable!(),
        }
    }
}

pub fn ready_index(event: &PlaybackEvent) -> Option<usize> {
    match event {
        PlaybackEvent::FrameReady { index, .. } => Some(*index),
        _ => None,
    }
}

pub fn label_index(event: &PlaybackEvent) -> Option<usize> {
    match event {
        PlaybackEvent::Label { index, .. } => Some(*index),
        _ => None,
    }
}
