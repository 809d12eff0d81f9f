//! Chain-code shape decoding.
//!
//! The cursor `(row, col)` addresses a staggered grid where each real cell
//! spans two cursor steps. Even rows place vertices on a cell row and move
//! fractionally along the column axis; odd rows do the opposite. The
//! half-step arithmetic, including the `col - 1` on even rows, matches the
//! producer of the payloads exactly.

use projection::{PlanarProjection, SwissGrid};
use radar_common::{DecodeError, GridConfig};
use serde::{Deserialize, Serialize};

use crate::geometry::{GeoPoint, GeoPolygon};

/// Subtracted from each delta character code to get a signed step.
/// `'M'` (77) therefore means "no movement".
pub const DELTA_BIAS: i64 = 77;

/// Offset digits are tenths of a cell.
pub const OFFSET_SCALE: f64 = 10.0;

/// Added to each offset so vertices sit in the middle of their tenth.
pub const OFFSET_CENTER: f64 = 0.05;

/// One shape as it appears on the wire, with descriptive field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedShape {
    pub start_row: i64,
    pub start_col: i64,
    /// Two characters per vertex: row delta then column delta.
    pub delta_chain: String,
    /// One decimal digit per vertex.
    pub offsets: String,
}

impl EncodedShape {
    pub fn new(
        start_row: i64,
        start_col: i64,
        delta_chain: impl Into<String>,
        offsets: impl Into<String>,
    ) -> Self {
        Self {
            start_row,
            start_col,
            delta_chain: delta_chain.into(),
            offsets: offsets.into(),
        }
    }

    /// Number of vertices decoding will produce.
    pub fn vertex_count(&self) -> usize {
        self.offsets.chars().count()
    }

    /// Reject offsets that are not decimal digits.
    pub fn validate(&self) -> Result<(), DecodeError> {
        match self
            .offsets
            .chars()
            .enumerate()
            .find(|(_, c)| !c.is_ascii_digit())
        {
            Some((position, found)) => Err(DecodeError::InvalidOffset { position, found }),
            None => Ok(()),
        }
    }
}

/// Sub-cell position for an offset digit.
#[inline]
pub fn fractional_offset(digit: u32) -> f64 {
    digit as f64 / OFFSET_SCALE + OFFSET_CENTER
}

/// Grid axis indices `(row_axis, col_axis)` for a cursor and sub-cell offset.
#[inline]
pub fn axis_indices(row: i64, col: i64, frac: f64) -> (f64, f64) {
    if row.rem_euclid(2) == 0 {
        (row as f64 / 2.0, (col - 1) as f64 / 2.0 + frac)
    } else {
        ((row - 1) as f64 / 2.0 + frac, col as f64 / 2.0)
    }
}

/// Signed step encoded by a delta character.
#[inline]
pub fn delta_step(c: char) -> i64 {
    c as i64 - DELTA_BIAS
}

/// Advance the cursor after vertex `idx`.
///
/// Once the chain is exhausted the cursor stays where it is, so trailing
/// vertices share a cell and differ only by their offset. A chain of odd
/// length moves the row but not the column on its last step.
#[inline]
pub fn step_cursor(cursor: (i64, i64), chain: &[char], idx: usize) -> (i64, i64) {
    let (mut row, mut col) = cursor;
    if 2 * idx < chain.len() {
        row += delta_step(chain[2 * idx]);
        if let Some(&c) = chain.get(2 * idx + 1) {
            col += delta_step(c);
        }
    }
    (row, col)
}

/// Decodes shapes against a grid using a planar projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeDecoder<P = SwissGrid> {
    projection: P,
}

impl ShapeDecoder<SwissGrid> {
    pub fn swiss() -> Self {
        Self {
            projection: SwissGrid,
        }
    }
}

impl<P: PlanarProjection> ShapeDecoder<P> {
    pub fn with_projection(projection: P) -> Self {
        Self { projection }
    }

    /// Decode one shape into a ring with exactly `offsets.len()` vertices.
    ///
    /// The grid must already be validated. Non-digit offsets decode as 0;
    /// call [`EncodedShape::validate`] first to reject them instead.
    pub fn decode(&self, shape: &EncodedShape, grid: &GridConfig) -> GeoPolygon {
        let chain: Vec<char> = shape.delta_chain.chars().collect();
        let rows = grid.x_axis();
        let cols = grid.y_axis();

        let mut cursor = (shape.start_row, shape.start_col);
        let mut ring = Vec::with_capacity(shape.vertex_count());

        for (idx, c) in shape.offsets.chars().enumerate() {
            let frac = fractional_offset(c.to_digit(10).unwrap_or(0));
            let (row_index, col_index) = axis_indices(cursor.0, cursor.1, frac);

            let easting = rows.index_to_meters(row_index);
            let northing = cols.index_to_meters(col_index);
            ring.push(self.projection.to_geographic(easting, northing).into());

            cursor = step_cursor(cursor, &chain, idx);
        }

        ring
    }
}

/// Decode with the Swiss grid projection.
pub fn decode(shape: &EncodedShape, grid: &GridConfig) -> Vec<GeoPoint> {
    ShapeDecoder::swiss().decode(shape, grid)
}
