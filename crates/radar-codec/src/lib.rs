//! Decoding of chain-coded radar contour payloads.
//!
//! A frame payload describes precipitation areas as shapes on a planar
//! grid. Each shape is a start cell plus two strings: a chain of cursor
//! deltas and one sub-cell offset digit per vertex. Decoding walks the
//! chain, places each vertex inside its cell, and projects it to WGS84.
//!
//! ```text
//! payload bytes ─► FramePayload (serde)
//!                      │
//!                      ├─► GridConfig (validated)
//!                      │
//!                      └─► areas ─► EncodedShape ─► ShapeDecoder ─► GeoPolygon
//!                                                                     │
//!                                       grouped by colour ◄───────────┘
//!                                             │
//!                                             ▼
//!                                      Vec<ColorBand>
//! ```

pub mod error;
pub mod frame;
pub mod geometry;
pub mod payload;
pub mod shape;

pub use error::{CodecError, Result};
pub use frame::FrameGeometryBuilder;
pub use geometry::{ColorBand, GeoPoint, GeoPolygon};
pub use payload::{Area, Coords, FramePayload, WireShape};
pub use shape::{decode, EncodedShape, ShapeDecoder};
