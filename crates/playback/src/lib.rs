//! Timeline playback for animated radar frames.
//!
//! A timeline (one epoch of frames from a manifest) is played back by a
//! controller that supports autoplay, pause and drag-to-scrub. Frame
//! payloads are fetched lazily through an injected [`FrameSource`],
//! decoded with [`radar_codec`], cached per epoch, and reported to the host
//! as [`PlaybackEvent`]s.
//!
//! # Architecture
//!
//! ```text
//! PlaybackHandle ──commands──► PlaybackController (one task)
//!                                   │
//!                                   ├─► PlaybackSession (pure state machine)
//!                                   │       ├─ tick / scrub / replace_epoch
//!                                   │       └─ request generation
//!                                   │
//!                                   ├─► FrameCache hit ──► FrameReady
//!                                   │
//!                                   └─► JoinSet: fetch + decode
//!                                             │
//!                                             ▼
//!                                   generation still current?
//!                                       ├─ yes ─► FrameReady / FrameLoadError
//!                                       └─ no  ─► dropped
//! ```
//!
//! # Example
//!
//! ```ignore
//! use playback::{PlaybackConfig, PlaybackController, PlaybackEvent};
//!
//! let (handle, mut events, _task) = PlaybackController::spawn_http(PlaybackConfig::from_env())?;
//! handle.load_manifest("radar/manifest.json").await?;
//!
//! while let Some(event) = events.recv().await {
//!     if let PlaybackEvent::FrameReady { label, areas, .. } = event {
//!         // hand `areas` to the map
//!     }
//! }
//! ```

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod manifest;
pub mod metrics;
pub mod session;
pub mod source;
pub mod throttle;
pub mod timeline;

// Re-export commonly used types at crate root
pub use cache::{CacheStats, FrameAreas, FrameCache};
pub use config::PlaybackConfig;
pub use controller::{load_frame, PlaybackController, PlaybackEvent, PlaybackHandle, PlaybackSnapshot};
pub use error::{FetchError, FrameError, FrameLoadError, ManifestFetchError, PlaybackError, Result};
pub use manifest::{load_manifest, Manifest, ManifestEntry};
pub use crate::metrics::{MetricsSnapshot, PlaybackMetrics};
pub use session::{Dispatch, PlaybackMode, PlaybackSession, PlaybackState};
pub use source::{FrameSource, HttpFrameSource, RetryPolicy, RetryingSource};
pub use throttle::TrailingThrottle;
pub use timeline::{Frame, Timeline};
