//! Async driver for [`PlaybackSession`].
//!
//! A single task owns the session, the frame cache and every timer. It
//! selects over host commands, the autoplay tick, the scrub throttle
//! deadline and completed frame loads. Loads run as separate tasks and are
//! never aborted; a finished load is applied only if the session still
//! considers it current.

use std::sync::Arc;
use std::time::Duration;

use radar_codec::FrameGeometryBuilder;
use radar_common::{FrameLabeler, TimestampLabeler};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::cache::{CacheStats, FrameAreas, FrameCache};
use crate::config::PlaybackConfig;
use crate::error::{FetchError, FrameError, FrameLoadError, ManifestFetchError, PlaybackError, Result};
use crate::manifest::load_manifest;
use crate::metrics::{MetricsSnapshot, PlaybackMetrics};
use crate::session::{Dispatch, PlaybackMode, PlaybackSession, PlaybackState};
use crate::source::{FrameSource, HttpFrameSource, RetryPolicy, RetryingSource};
use crate::timeline::{frames_from_manifest, Frame};

const COMMAND_BUFFER: usize = 64;

/// What the controller reports to the host.
#[derive(Debug)]
pub enum PlaybackEvent {
    /// The selected frame changed. Sent before its geometry is available.
    Label {
        index: usize,
        timestamp: i64,
        label: String,
    },
    /// Geometry for `index` is now the visible frame.
    FrameReady {
        index: usize,
        label: String,
        areas: FrameAreas,
    },
    /// The current frame could not be loaded. The previous geometry stays
    /// visible.
    FrameLoadError(FrameLoadError),
    StateChanged(PlaybackMode),
    /// The timeline is empty.
    NoData,
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub epoch: u64,
    pub len: usize,
    /// Index of the frame whose geometry was last applied in this epoch.
    pub visible_index: Option<usize>,
    pub metrics: MetricsSnapshot,
    pub cache: CacheStats,
}

enum Command {
    Play,
    Pause,
    Scrub(usize),
    ScrubToTimestamp(i64),
    ReplaceEpoch(Vec<Frame>),
    Snapshot(oneshot::Sender<PlaybackSnapshot>),
    Shutdown,
}

struct FetchOutcome {
    dispatch: Dispatch,
    result: std::result::Result<FrameAreas, FrameError>,
}

/// Cloneable handle for driving a running controller.
#[derive(Clone)]
pub struct PlaybackHandle {
    commands: mpsc::Sender<Command>,
    source: Arc<dyn FrameSource>,
    fetch_timeout: Duration,
}

impl PlaybackHandle {
    pub async fn play(&self) -> Result<()> {
        self.send(Command::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    /// Select `index` (clamped to the timeline). The frame is loaded once the
    /// scrub throttle window closes.
    pub async fn scrub(&self, index: usize) -> Result<()> {
        self.send(Command::Scrub(index)).await
    }

    /// Select the frame nearest to `timestamp` (unix seconds).
    pub async fn scrub_to_timestamp(&self, timestamp: i64) -> Result<()> {
        self.send(Command::ScrubToTimestamp(timestamp)).await
    }

    /// Replace the timeline. Playback restarts from the latest frame.
    pub async fn replace_epoch(&self, frames: Vec<Frame>) -> Result<()> {
        self.send(Command::ReplaceEpoch(frames)).await
    }

    /// Fetch a manifest and install it as the new epoch.
    ///
    /// On failure the timeline is cleared, the controller reports
    /// [`PlaybackEvent::NoData`] and the error is returned. Playback stays
    /// empty until another manifest is supplied.
    pub async fn load_manifest(&self, reference: &str) -> Result<usize> {
        let loaded = match time::timeout(
            self.fetch_timeout,
            load_manifest(self.source.as_ref(), reference),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ManifestFetchError::from(FetchError::Timeout(self.fetch_timeout))),
        };

        match loaded {
            Ok(manifest) => {
                let frames = frames_from_manifest(manifest);
                let count = frames.len();
                self.replace_epoch(frames).await?;
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, reference = %reference, "Manifest unavailable, clearing timeline");
                self.replace_epoch(Vec::new()).await?;
                Err(e.into())
            }
        }
    }

    pub async fn snapshot(&self) -> Result<PlaybackSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        response.await.map_err(|_| PlaybackError::Closed)
    }

    /// Stop the controller. Loads still in flight are dropped.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::Closed)
    }
}

/// The controller task. Created and started with [`PlaybackController::spawn`].
pub struct PlaybackController {
    session: PlaybackSession,
    cache: FrameCache,
    source: Arc<dyn FrameSource>,
    builder: FrameGeometryBuilder,
    labeler: Arc<dyn FrameLabeler>,
    metrics: PlaybackMetrics,
    tick_interval: Duration,
    fetch_timeout: Duration,
    commands: mpsc::Receiver<Command>,
    events: mpsc::Sender<PlaybackEvent>,
    tasks: JoinSet<FetchOutcome>,
    ticker: Option<Interval>,
    visible_index: Option<usize>,
}

impl PlaybackController {
    /// Start a controller with an empty timeline.
    ///
    /// The source is wrapped in a [`RetryingSource`] unless
    /// `config.max_retries` is 0. Returns the command handle, the event
    /// stream and the controller task.
    pub fn spawn(
        source: Arc<dyn FrameSource>,
        config: PlaybackConfig,
        labeler: Arc<dyn FrameLabeler>,
    ) -> Result<(PlaybackHandle, mpsc::Receiver<PlaybackEvent>, JoinHandle<()>)> {
        config.validate().map_err(PlaybackError::Config)?;

        let source: Arc<dyn FrameSource> = if config.max_retries > 0 {
            Arc::new(RetryingSource::new(source, RetryPolicy::from_config(&config)))
        } else {
            source
        };

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);

        let controller = Self {
            session: PlaybackSession::new(config.scrub_throttle()),
            cache: FrameCache::new(config.cache_capacity),
            source: Arc::clone(&source),
            builder: FrameGeometryBuilder::swiss(),
            labeler,
            metrics: PlaybackMetrics::new(),
            tick_interval: config.tick_interval(),
            fetch_timeout: config.fetch_timeout(),
            commands: command_rx,
            events: event_tx,
            tasks: JoinSet::new(),
            ticker: None,
            visible_index: None,
        };

        let handle = PlaybackHandle {
            commands: command_tx,
            source,
            fetch_timeout: config.fetch_timeout(),
        };

        Ok((handle, event_rx, tokio::spawn(controller.run())))
    }

    /// Start a controller that fetches over HTTP from `config.base_url` and
    /// labels frames with `config.label_format`.
    pub fn spawn_http(
        config: PlaybackConfig,
    ) -> Result<(PlaybackHandle, mpsc::Receiver<PlaybackEvent>, JoinHandle<()>)> {
        let source = HttpFrameSource::from_config(&config).map_err(|e| PlaybackError::Config(e.to_string()))?;
        let labeler = TimestampLabeler::with_offset_minutes(config.label_format.clone(), config.utc_offset_minutes);
        Self::spawn(Arc::new(source), config, Arc::new(labeler))
    }

    async fn run(mut self) {
        info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            "Playback controller started"
        );

        loop {
            let throttle_deadline = self.session.throttle_deadline();

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(joined) = self.tasks.join_next() => self.on_load_complete(joined).await,
                _ = sleep_until_opt(throttle_deadline) => self.on_throttle_expired().await,
                _ = next_tick(&mut self.ticker) => self.on_tick().await,
            }
        }

        info!(in_flight = self.tasks.len(), "Playback controller stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play => {
                if self.session.play() {
                    self.start_ticker();
                    self.emit_state().await;
                }
            }
            Command::Pause => {
                if self.session.pause() {
                    self.ticker = None;
                    self.emit_state().await;
                }
            }
            Command::Scrub(index) => {
                let previous = self.session.mode();
                let selected = self.session.scrub(index, Instant::now());
                self.after_scrub(previous, selected).await;
            }
            Command::ScrubToTimestamp(timestamp) => {
                let previous = self.session.mode();
                let selected = self.session.scrub_to_timestamp(timestamp, Instant::now());
                self.after_scrub(previous, selected).await;
            }
            Command::ReplaceEpoch(frames) => self.replace_epoch(frames).await,
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown => {}
        }
    }

    async fn after_scrub(&mut self, previous: PlaybackMode, selected: Option<usize>) {
        let Some(index) = selected else {
            return;
        };
        self.ticker = None;
        if previous != self.session.mode() {
            self.emit_state().await;
        }
        self.emit_label(index).await;
    }

    #[instrument(skip(self, frames), fields(frames = frames.len()))]
    async fn replace_epoch(&mut self, frames: Vec<Frame>) {
        let previous = self.session.mode();
        let dispatch = self.session.replace_epoch(frames);
        self.cache.reset(self.session.epoch());
        self.visible_index = None;

        info!(
            epoch = self.session.epoch(),
            generation = self.session.generation(),
            "Timeline epoch replaced"
        );

        match dispatch {
            Some(dispatch) => {
                self.start_ticker();
                if previous != self.session.mode() {
                    self.emit_state().await;
                }
                self.emit_label(dispatch.index).await;
                self.dispatch(dispatch).await;
            }
            None => {
                self.ticker = None;
                if previous != self.session.mode() {
                    self.emit_state().await;
                }
                self.emit(PlaybackEvent::NoData).await;
            }
        }
    }

    async fn on_tick(&mut self) {
        if let Some(dispatch) = self.session.tick() {
            self.emit_label(dispatch.index).await;
            self.dispatch(dispatch).await;
        }
    }

    async fn on_throttle_expired(&mut self) {
        if let Some(dispatch) = self.session.flush_scrub(Instant::now()) {
            self.dispatch(dispatch).await;
        }
    }

    async fn dispatch(&mut self, dispatch: Dispatch) {
        self.metrics.record_dispatch();
        debug!(
            index = dispatch.index,
            generation = dispatch.generation,
            epoch = dispatch.epoch,
            reference = %dispatch.frame.reference,
            "Dispatching frame load"
        );

        if let Some(areas) = self.cache.get(dispatch.index) {
            self.metrics.record_cache_hit();
            debug!(index = dispatch.index, "Frame cache hit");
            self.apply(dispatch.index, areas).await;
            return;
        }

        let source = Arc::clone(&self.source);
        let builder = self.builder;
        let limit = self.fetch_timeout;
        self.tasks.spawn(async move {
            let result = load_frame(source.as_ref(), &builder, &dispatch.frame.reference, limit).await;
            FetchOutcome { dispatch, result }
        });
    }

    /// Results of superseded requests are dropped without caching or events.
    async fn on_load_complete(&mut self, joined: std::result::Result<FetchOutcome, JoinError>) {
        let FetchOutcome { dispatch, result } = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Frame load task failed");
                return;
            }
        };

        let current = self.session.is_current(dispatch.generation, dispatch.epoch);

        match result {
            Ok(areas) if current => {
                self.cache.insert(dispatch.epoch, dispatch.index, Arc::clone(&areas));
                self.apply(dispatch.index, areas).await;
            }
            Err(cause) if current => {
                self.metrics.record_error();
                warn!(
                    index = dispatch.index,
                    reference = %dispatch.frame.reference,
                    error = %cause,
                    "Frame load failed, keeping last geometry"
                );
                self.emit(PlaybackEvent::FrameLoadError(FrameLoadError {
                    index: dispatch.index,
                    cause,
                }))
                .await;
            }
            Ok(_) | Err(_) => self.discard_stale(&dispatch),
        }
    }

    fn discard_stale(&self, dispatch: &Dispatch) {
        self.metrics.record_stale();
        debug!(
            index = dispatch.index,
            generation = dispatch.generation,
            epoch = dispatch.epoch,
            latest_generation = self.session.generation(),
            "Discarding stale frame result"
        );
    }

    async fn apply(&mut self, index: usize, areas: FrameAreas) {
        self.visible_index = Some(index);
        self.metrics.record_applied();

        let label = self.label_for(index).map(|(_, label)| label).unwrap_or_default();
        debug!(index = index, bands = areas.len(), "Frame applied");
        self.emit(PlaybackEvent::FrameReady { index, label, areas }).await;
    }

    fn start_ticker(&mut self) {
        let mut ticker = time::interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
    }

    fn label_for(&self, index: usize) -> Option<(i64, String)> {
        let frame = self.session.timeline().at(index)?;
        Some((frame.timestamp, self.labeler.label(frame.timestamp)))
    }

    async fn emit_label(&self, index: usize) {
        if let Some((timestamp, label)) = self.label_for(index) {
            self.emit(PlaybackEvent::Label {
                index,
                timestamp,
                label,
            })
            .await;
        }
    }

    async fn emit_state(&self) {
        let mode = self.session.mode();
        info!(mode = ?mode, index = self.session.current_index(), "Playback state changed");
        self.emit(PlaybackEvent::StateChanged(mode)).await;
    }

    async fn emit(&self, event: PlaybackEvent) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.events.send(event).await;
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.session.state(),
            epoch: self.session.epoch(),
            len: self.session.timeline().len(),
            visible_index: self.visible_index,
            metrics: self.metrics.snapshot(),
            cache: self.cache.stats(),
        }
    }
}

/// Fetch and decode one frame, bounded by `limit`.
#[instrument(skip(source, builder))]
pub async fn load_frame(
    source: &dyn FrameSource,
    builder: &FrameGeometryBuilder,
    reference: &str,
    limit: Duration,
) -> std::result::Result<FrameAreas, FrameError> {
    let bytes = time::timeout(limit, source.fetch(reference))
        .await
        .map_err(|_| FetchError::Timeout(limit))??;
    let bands = builder.from_slice(&bytes)?;
    Ok(bands.into())
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
