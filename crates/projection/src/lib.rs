//! Coordinate reference system transformations.
//!
//! Implements the Swiss national grid projection from scratch without
//! external dependencies.

pub mod swiss;

pub use swiss::{lv95_to_wgs84, wgs84_to_lv95, PlanarProjection, SwissGrid};
