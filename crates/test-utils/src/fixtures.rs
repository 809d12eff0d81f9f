//! Common test fixtures for radar decoding and playback tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios in radar frame processing.

/// Common grid definitions for testing.
pub mod grid {
    /// MeteoSwiss composite radar grid (1 km cells, LV03 offsets)
    pub const METEOSWISS: GridSpec = GridSpec {
        x_min: 255.0,
        x_max: 965.0,
        x_count: 710.0,
        y_min: -160.0,
        y_max: 480.0,
        y_count: 640.0,
    };

    /// Same extent at 2 km resolution
    pub const METEOSWISS_2KM: GridSpec = GridSpec {
        x_min: 255.0,
        x_max: 965.0,
        x_count: 355.0,
        y_min: -160.0,
        y_max: 480.0,
        y_count: 320.0,
    };

    /// Simple 10x10 km grid anchored at the Bern origin (LV03)
    pub const BERN_10KM: GridSpec = GridSpec {
        x_min: 600.0,
        x_max: 610.0,
        x_count: 10.0,
        y_min: 200.0,
        y_max: 210.0,
        y_count: 10.0,
    };

    /// Invalid grid (zero count)
    pub const ZERO_COUNT: GridSpec = GridSpec {
        x_min: 255.0,
        x_max: 965.0,
        x_count: 0.0,
        y_min: -160.0,
        y_max: 480.0,
        y_count: 640.0,
    };

    /// Grid specification for testing, mirroring the payload `coords` block.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub x_min: f64,
        pub x_max: f64,
        pub x_count: f64,
        pub y_min: f64,
        pub y_max: f64,
        pub y_count: f64,
    }

    impl GridSpec {
        /// Returns the payload `coords` object for this grid.
        pub fn to_json(&self) -> serde_json::Value {
            serde_json::json!({
                "system": "swissgrid",
                "x_min": self.x_min,
                "x_max": self.x_max,
                "x_count": self.x_count,
                "y_min": self.y_min,
                "y_max": self.y_max,
                "y_count": self.y_count,
            })
        }

        /// Returns the resolution in kilometers.
        pub fn resolution(&self) -> (f64, f64) {
            (
                (self.x_max - self.x_min) / self.x_count,
                (self.y_max - self.y_min) / self.y_count,
            )
        }
    }
}

/// Common time values for testing.
pub mod time {
    /// A fixed reference time for tests (2024-01-15T12:00:00Z)
    pub const REFERENCE_TS: i64 = 1_705_320_000;

    /// Radar composites are published every five minutes
    pub const FRAME_STEP_SECS: i64 = 300;
}

/// Common intensity colours, as used by the MeteoSwiss legend.
pub mod colors {
    pub const LIGHT: &str = "9696ff";
    pub const MODERATE: &str = "0000c8";
    pub const HEAVY: &str = "ffff00";
    pub const EXTREME: &str = "ff0000";
}
