//! Frame timestamps and display labels.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};

/// Default label format, day-first as shown on the MeteoSwiss site.
pub const DEFAULT_LABEL_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Convert a frame timestamp (unix seconds) to a UTC datetime.
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn frame_datetime(timestamp: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp, 0).single()
}

/// Produces the human-readable label shown next to a frame.
///
/// Localisation is the host's concern; implementations are injected.
pub trait FrameLabeler: Send + Sync {
    fn label(&self, timestamp: i64) -> String;
}

impl<F> FrameLabeler for F
where
    F: Fn(i64) -> String + Send + Sync,
{
    fn label(&self, timestamp: i64) -> String {
        self(timestamp)
    }
}

/// Formats timestamps with a strftime pattern at a fixed UTC offset.
#[derive(Debug, Clone)]
pub struct TimestampLabeler {
    format: String,
    offset: FixedOffset,
}

impl TimestampLabeler {
    pub fn new(format: impl Into<String>, offset: FixedOffset) -> Self {
        Self {
            format: format.into(),
            offset,
        }
    }

    /// Build from an offset in minutes east of UTC.
    ///
    /// Out-of-range offsets fall back to UTC.
    pub fn with_offset_minutes(format: impl Into<String>, minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or(utc_offset());
        Self::new(format, offset)
    }
}

impl Default for TimestampLabeler {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_FORMAT, utc_offset())
    }
}

impl FrameLabeler for TimestampLabeler {
    fn label(&self, timestamp: i64) -> String {
        match frame_datetime(timestamp) {
            Some(dt) => dt.with_timezone(&self.offset).format(&self.format).to_string(),
            None => timestamp.to_string(),
        }
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}
