//! Error types for frame decoding.

use radar_common::{DecodeError, FramePayloadError};
use thiserror::Error;

/// Why a frame could not be turned into geometry.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Payload(#[from] FramePayloadError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Payload(err.into())
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
