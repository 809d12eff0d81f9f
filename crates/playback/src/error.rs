//! Error types for playback and frame loading.

use std::time::Duration;

use radar_codec::CodecError;
use thiserror::Error;

/// Failure to retrieve bytes from a [`FrameSource`](crate::source::FrameSource).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Upstream returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unknown reference: {0}")]
    NotFound(String),
}

impl FetchError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::NotFound(_) => false,
        }
    }
}

/// The timeline could not be obtained. Terminal for the session until a
/// new manifest is supplied.
#[derive(Debug, Error)]
pub enum ManifestFetchError {
    #[error("Failed to fetch manifest: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to parse manifest: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ManifestFetchError {
    fn from(err: serde_json::Error) -> Self {
        ManifestFetchError::Parse(err.to_string())
    }
}

/// Why one frame could not be loaded.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A frame failed to load. Playback continues and the last good geometry
/// stays visible.
#[derive(Debug, Error)]
#[error("Failed to load frame {index}: {cause}")]
pub struct FrameLoadError {
    pub index: usize,
    #[source]
    pub cause: FrameError,
}

/// Errors from the playback handle.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Playback controller has shut down")]
    Closed,

    #[error("Invalid playback configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Manifest(#[from] ManifestFetchError),
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
