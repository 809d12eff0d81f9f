//! Assembly of a frame payload into colour-banded polygons.

use std::collections::HashMap;

use projection::{PlanarProjection, SwissGrid};
use tracing::debug;

use crate::error::Result;
use crate::geometry::{is_drawable, ColorBand};
use crate::payload::FramePayload;
use crate::shape::ShapeDecoder;

/// Turns frame payloads into [`ColorBand`]s.
///
/// Building is all-or-nothing: the first malformed field or invalid shape
/// fails the whole frame and no partial geometry is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameGeometryBuilder<P = SwissGrid> {
    decoder: ShapeDecoder<P>,
}

impl FrameGeometryBuilder<SwissGrid> {
    pub fn swiss() -> Self {
        Self {
            decoder: ShapeDecoder::swiss(),
        }
    }
}

impl<P: PlanarProjection> FrameGeometryBuilder<P> {
    pub fn with_projection(projection: P) -> Self {
        Self {
            decoder: ShapeDecoder::with_projection(projection),
        }
    }

    /// Parse payload bytes and build the frame.
    pub fn from_slice(&self, bytes: &[u8]) -> Result<Vec<ColorBand>> {
        let payload = FramePayload::from_slice(bytes)?;
        self.build(&payload)
    }

    /// Decode every shape and group the drawable ones by colour.
    ///
    /// Bands keep the order in which their colour first appears.
    /// Rings with fewer than three distinct vertices are dropped.
    pub fn build(&self, payload: &FramePayload) -> Result<Vec<ColorBand>> {
        let grid = payload.grid()?;
        let areas = payload.areas()?;

        // Validate before decoding anything
        for area in areas {
            for shape in area.shapes.iter().flatten() {
                shape.to_encoded().validate()?;
            }
        }

        let mut bands: Vec<ColorBand> = Vec::new();
        let mut band_index: HashMap<&str, usize> = HashMap::new();
        let mut dropped = 0usize;

        for area in areas {
            let slot = *band_index.entry(area.color.as_str()).or_insert_with(|| {
                bands.push(ColorBand::new(area.color.clone()));
                bands.len() - 1
            });

            for shape in area.encoded_shapes() {
                let ring = self.decoder.decode(&shape, &grid);
                if is_drawable(&ring) {
                    bands[slot].polygons.push(ring);
                } else {
                    dropped += 1;
                }
            }
        }

        debug!(
            bands = bands.len(),
            polygons = bands.iter().map(|b| b.polygons.len()).sum::<usize>(),
            dropped = dropped,
            "Built frame geometry"
        );

        Ok(bands)
    }
}
