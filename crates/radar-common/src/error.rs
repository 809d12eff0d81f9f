//! Error types shared by the decoding crates.

use thiserror::Error;

/// A frame payload that is malformed or incomplete.
///
/// Surfaced per frame; never halts playback.
#[derive(Debug, Error)]
pub enum FramePayloadError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Malformed frame payload: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for FramePayloadError {
    fn from(err: serde_json::Error) -> Self {
        FramePayloadError::Malformed(err.to_string())
    }
}

/// Input that parsed correctly but violates a decoding invariant.
///
/// Fatal for the frame being decoded only.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid offset character {found:?} at position {position}")]
    InvalidOffset { position: usize, found: char },
}
