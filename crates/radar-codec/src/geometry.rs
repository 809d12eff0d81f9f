//! Decoded geographic geometry.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    fn bits(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.lng.to_bits())
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// An ordered ring of vertices. Not necessarily closed.
pub type GeoPolygon = Vec<GeoPoint>;

/// All polygons of one precipitation intensity class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorBand {
    /// Hex colour without the leading `#`.
    pub color_hex: String,
    #[serde(rename = "rings")]
    pub polygons: Vec<GeoPolygon>,
}

impl ColorBand {
    pub fn new(color_hex: impl Into<String>) -> Self {
        Self {
            color_hex: color_hex.into(),
            polygons: Vec::new(),
        }
    }

    /// Rings as `(lat, lng)` tuples, for renderers that want plain pairs.
    pub fn rings(&self) -> impl Iterator<Item = Vec<(f64, f64)>> + '_ {
        self.polygons
            .iter()
            .map(|ring| ring.iter().map(|p| (p.lat, p.lng)).collect())
    }

    /// CSS colour string with the leading `#`.
    pub fn css_color(&self) -> String {
        format!("#{}", self.color_hex)
    }

    pub fn vertex_count(&self) -> usize {
        self.polygons.iter().map(Vec::len).sum()
    }
}

/// Whether a ring has at least three distinct vertices.
///
/// Vertices compare by exact bit pattern.
pub fn is_drawable(ring: &[GeoPoint]) -> bool {
    let mut seen = HashSet::with_capacity(3);
    for point in ring {
        seen.insert(point.bits());
        if seen.len() >= 3 {
            return true;
        }
    }
    false
}
