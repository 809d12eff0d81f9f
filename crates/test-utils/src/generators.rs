//! Test data generators for synthetic radar payloads and manifests.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use serde_json::{json, Value};

use crate::fixtures::grid::GridSpec;

/// Reference string used for the frame at `timestamp`.
pub fn frame_reference(timestamp: i64) -> String {
    format!("radar/precipitation_{}.json", timestamp)
}

/// Creates a manifest JSON array with `count` evenly spaced frames.
///
/// # Example
///
/// ```
/// use test_utils::manifest_json;
///
/// let manifest: serde_json::Value = serde_json::from_str(&manifest_json(3, 1000, 300)).unwrap();
/// assert_eq!(manifest[2]["timestamp"], 1600);
/// assert_eq!(manifest[2]["reference"], "radar/precipitation_1600.json");
/// ```
pub fn manifest_json(count: usize, start_ts: i64, step_secs: i64) -> String {
    let entries: Vec<Value> = (0..count)
        .map(|i| {
            let ts = start_ts + i as i64 * step_secs;
            json!({ "timestamp": ts, "reference": frame_reference(ts) })
        })
        .collect();
    Value::Array(entries).to_string()
}

/// A four-vertex shape that always survives degenerate-ring filtering.
///
/// `row` must be even. The chain steps down a row, right a column, then
/// back up, so every vertex lands on a different cell edge.
pub fn diamond_shape(row: i64, col: i64) -> Value {
    json!({ "i": row, "j": col, "d": "NMMNLM", "o": "5555", "l": 1 })
}

/// A shape whose vertices all coincide (empty chain, repeated offset).
pub fn degenerate_shape(row: i64, col: i64) -> Value {
    json!({ "i": row, "j": col, "d": "", "o": "555", "l": 1 })
}

/// Creates a frame payload from `(color, shapes)` pairs.
pub fn payload_json(grid: &GridSpec, areas: &[(&str, Vec<Value>)]) -> Vec<u8> {
    let areas: Vec<Value> = areas
        .iter()
        .map(|(color, shapes)| json!({ "color": color, "shapes": [shapes] }))
        .collect();
    json!({ "coords": grid.to_json(), "areas": areas })
        .to_string()
        .into_bytes()
}

/// Creates a deterministic pseudo-random shape as `(row, col, chain, offsets)`.
///
/// The chain may be shorter than needed so that exhausted-chain tails are
/// exercised. Delta characters stay within `'J'..='P'` (steps -3..=3).
pub fn pseudo_random_shape(seed: u32) -> (i64, i64, String, String) {
    let h = simple_hash(seed, 0, 0x5eed);
    let vertices = 1 + (h % 40) as usize;
    let chain_steps = (simple_hash(seed, 1, h) as usize) % (vertices + 1);

    let offsets: String = (0..vertices)
        .map(|i| char::from(b'0' + (simple_hash(seed, i as u32 + 2, h) % 10) as u8))
        .collect();
    let chain: String = (0..chain_steps * 2)
        .map(|i| char::from(b'J' + (simple_hash(seed, i as u32 + 100, h) % 7) as u8))
        .collect();

    let row = 100 + (h % 1000) as i64;
    let col = 100 + (simple_hash(h, seed, 7) % 1000) as i64;
    (row, col, chain, offsets)
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}
