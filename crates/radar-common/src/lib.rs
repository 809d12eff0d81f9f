//! Common types and utilities shared across the radar crates.

pub mod error;
pub mod grid;
pub mod time;

pub use error::{DecodeError, FramePayloadError};
pub use grid::{GridAxis, GridConfig};
pub use time::{FrameLabeler, TimestampLabeler};
