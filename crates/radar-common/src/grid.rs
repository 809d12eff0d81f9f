//! Planar grid specification used by radar contour payloads.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Kilometers to meters.
pub const KM_TO_M: f64 = 1000.0;

/// Regular planar grid over the Swiss national reference frame.
///
/// Extents are in kilometers. The `x` axis carries eastings and the `y`
/// axis northings; both may be given relative to the LV03 false origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub x_min: f64,
    pub x_max: f64,
    pub x_count: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub y_count: f64,
}

impl GridConfig {
    /// Build and validate a grid.
    pub fn new(
        x_min: f64,
        x_max: f64,
        x_count: f64,
        y_min: f64,
        y_max: f64,
        y_count: f64,
    ) -> Result<Self, DecodeError> {
        let grid = Self {
            x_min,
            x_max,
            x_count,
            y_min,
            y_max,
            y_count,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Check counts are positive and extents non-empty on both axes.
    pub fn validate(&self) -> Result<(), DecodeError> {
        self.x_axis().validate("x")?;
        self.y_axis().validate("y")
    }

    /// Axis addressed by shape rows.
    pub fn x_axis(&self) -> GridAxis {
        GridAxis {
            min: self.x_min,
            max: self.x_max,
            count: self.x_count,
        }
    }

    /// Axis addressed by shape columns.
    pub fn y_axis(&self) -> GridAxis {
        GridAxis {
            min: self.y_min,
            max: self.y_max,
            count: self.y_count,
        }
    }

    /// Cell size in kilometers as `(dx, dy)`.
    pub fn resolution_km(&self) -> (f64, f64) {
        (self.x_axis().cell_size(), self.y_axis().cell_size())
    }
}

/// One linear axis of a [`GridConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxis {
    pub min: f64,
    pub max: f64,
    pub count: f64,
}

impl GridAxis {
    /// Map a (possibly fractional) cell index to plane meters.
    #[inline]
    pub fn index_to_meters(&self, index: f64) -> f64 {
        (self.min + (self.max - self.min) * index / self.count) * KM_TO_M
    }

    /// Width of one cell in kilometers.
    pub fn cell_size(&self) -> f64 {
        (self.max - self.min) / self.count
    }

    fn validate(&self, name: &str) -> Result<(), DecodeError> {
        if !(self.count > 0.0) {
            return Err(DecodeError::InvalidGrid(format!(
                "{}_count must be > 0, got {}",
                name, self.count
            )));
        }
        if !(self.max > self.min) {
            return Err(DecodeError::InvalidGrid(format!(
                "{name}_max ({}) must be greater than {name}_min ({})",
                self.max, self.min
            )));
        }
        Ok(())
    }
}

/// Well-known grids.
pub mod grids {
    use super::GridConfig;

    /// MeteoSwiss composite radar grid (1 km cells, LV03 offsets).
    pub fn meteoswiss_radar() -> GridConfig {
        GridConfig {
            x_min: 255.0,
            x_max: 965.0,
            x_count: 710.0,
            y_min: -160.0,
            y_max: 480.0,
            y_count: 640.0,
        }
    }
}
