//! Swiss national grid (LV95 / CH1903+) to WGS84.
//!
//! Uses the swisstopo approximate polynomial formulas, accurate to roughly
//! one meter over Switzerland. Inputs may be given in LV03 form (without
//! the 2 000 000 / 1 000 000 false-origin prefix); they are shifted into
//! LV95 before the polynomial is evaluated.
//!
//! Reference: swisstopo, "Approximate formulas for the transformation
//! between Swiss projection coordinates and WGS84".

/// LV95 false easting prefix.
pub const EASTING_PREFIX: f64 = 2_000_000.0;
/// LV95 false northing prefix.
pub const NORTHING_PREFIX: f64 = 1_000_000.0;
/// Easting of the projection origin (old observatory of Bern).
pub const ORIGIN_EASTING: f64 = 2_600_000.0;
/// Northing of the projection origin.
pub const ORIGIN_NORTHING: f64 = 1_200_000.0;

const AUX_SCALE: f64 = 1_000_000.0;

// The polynomial yields units of 10000"; this converts to degrees.
const TO_DEGREES: f64 = 100.0 / 36.0;

/// A projection from planar meters to geographic degrees.
pub trait PlanarProjection {
    /// Returns `(lat, lon)` in degrees.
    fn to_geographic(&self, easting_m: f64, northing_m: f64) -> (f64, f64);
}

/// The Swiss national grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwissGrid;

impl PlanarProjection for SwissGrid {
    #[inline]
    fn to_geographic(&self, easting_m: f64, northing_m: f64) -> (f64, f64) {
        lv95_to_wgs84(easting_m, northing_m)
    }
}

/// Shift truncated LV03-style coordinates into LV95.
///
/// The thresholds only make sense for coordinates inside Switzerland.
#[inline]
pub fn normalize_lv95(easting_m: f64, northing_m: f64) -> (f64, f64) {
    let easting = if easting_m < EASTING_PREFIX {
        easting_m + EASTING_PREFIX
    } else {
        easting_m
    };
    let northing = if northing_m < NORTHING_PREFIX {
        northing_m + NORTHING_PREFIX
    } else {
        northing_m
    };
    (easting, northing)
}

/// Convert Swiss grid meters to WGS84 `(lat, lon)` in degrees.
///
/// Never fails; points far outside Switzerland produce meaningless but
/// finite values and it is up to the caller to discard them.
pub fn lv95_to_wgs84(easting_m: f64, northing_m: f64) -> (f64, f64) {
    let (easting, northing) = normalize_lv95(easting_m, northing_m);

    let y = (easting - ORIGIN_EASTING) / AUX_SCALE;
    let x = (northing - ORIGIN_NORTHING) / AUX_SCALE;

    let y2 = y * y;
    let x2 = x * x;

    let lon = 2.6779094 + 4.728982 * y + 0.791484 * y * x + 0.1306 * y * x2 - 0.0436 * y2 * y;

    let lat = 16.9023892 + 3.238272 * x
        - 0.270978 * y2
        - 0.002528 * x2
        - 0.0447 * y2 * x
        - 0.0140 * x2 * x;

    (lat * TO_DEGREES, lon * TO_DEGREES)
}

/// Convert WGS84 degrees to LV95 `(easting, northing)` in meters.
///
/// Inverse of [`lv95_to_wgs84`] within the accuracy of the approximation.
pub fn wgs84_to_lv95(lat_deg: f64, lon_deg: f64) -> (f64, f64) {
    let phi = (lat_deg * 3600.0 - 169_028.66) / 10_000.0;
    let lambda = (lon_deg * 3600.0 - 26_782.5) / 10_000.0;

    let phi2 = phi * phi;
    let lambda2 = lambda * lambda;

    let easting = 2_600_072.37 + 211_455.93 * lambda
        - 10_938.51 * lambda * phi
        - 0.36 * lambda * phi2
        - 44.54 * lambda2 * lambda;

    let northing = 1_200_147.07 + 308_807.95 * phi + 3_745.25 * lambda2 + 76.63 * phi2
        - 194.56 * lambda2 * phi
        + 119.79 * phi2 * phi;

    (easting, northing)
}
