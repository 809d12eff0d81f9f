//! Wire format of a radar frame payload.
//!
//! ```json
//! {
//!   "coords": { "system": "swissgrid", "x_min": 255, "x_max": 965, "x_count": 710,
//!               "y_min": -160, "y_max": 480, "y_count": 640 },
//!   "areas": [
//!     { "color": "9696ff", "shapes": [[ { "i": 412, "j": 301, "d": "MNNM", "o": "450", "l": 3 } ]] }
//!   ]
//! }
//! ```
//!
//! Grid fields are optional at the serde level so that an incomplete
//! payload reports which field is missing instead of a generic parse error.

use radar_common::{FramePayloadError, GridConfig};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::shape::EncodedShape;

/// A complete frame payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FramePayload {
    #[serde(default)]
    pub coords: Option<Coords>,
    #[serde(default)]
    pub areas: Option<Vec<Area>>,
}

impl FramePayload {
    /// Parse payload bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Validated grid of this payload.
    pub fn grid(&self) -> Result<GridConfig> {
        let coords = self
            .coords
            .as_ref()
            .ok_or(FramePayloadError::MissingField("coords"))?;
        coords.grid()
    }

    /// Areas of this payload.
    pub fn areas(&self) -> Result<&[Area]> {
        self.areas
            .as_deref()
            .ok_or_else(|| FramePayloadError::MissingField("areas").into())
    }
}

/// Grid description embedded in each payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Coords {
    #[serde(default)]
    pub system: Option<String>,
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub x_count: Option<f64>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub y_count: Option<f64>,
}

impl Coords {
    /// Build the grid, naming the first absent field.
    pub fn grid(&self) -> Result<GridConfig> {
        fn required(value: Option<f64>, name: &'static str) -> Result<f64> {
            value.ok_or_else(|| FramePayloadError::MissingField(name).into())
        }

        let grid = GridConfig::new(
            required(self.x_min, "x_min")?,
            required(self.x_max, "x_max")?,
            required(self.x_count, "x_count")?,
            required(self.y_min, "y_min")?,
            required(self.y_max, "y_max")?,
            required(self.y_count, "y_count")?,
        )?;
        Ok(grid)
    }
}

/// One intensity class and its shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    /// Hex colour without `#`.
    pub color: String,
    #[serde(default)]
    pub shapes: Vec<Vec<WireShape>>,
}

impl Area {
    /// All shapes of this area, flattened in payload order.
    pub fn encoded_shapes(&self) -> impl Iterator<Item = EncodedShape> + '_ {
        self.shapes.iter().flatten().map(WireShape::to_encoded)
    }
}

/// A shape exactly as serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireShape {
    pub i: i64,
    pub j: i64,
    pub d: String,
    pub o: String,
    /// Legend level. Not interpreted here, passed through for styling.
    #[serde(rename = "l", default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<serde_json::Value>,
}

impl WireShape {
    pub fn to_encoded(&self) -> EncodedShape {
        EncodedShape::new(self.i, self.j, self.d.clone(), self.o.clone())
    }
}
