//! Frame manifests: the list of frames making up one epoch.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ManifestFetchError;
use crate::source::FrameSource;

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Unix seconds.
    pub timestamp: i64,
    /// Opaque reference passed to the frame source.
    pub reference: String,
}

/// A manifest as published: a JSON array of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ManifestFetchError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch and parse a manifest.
#[instrument(skip(source))]
pub async fn load_manifest(
    source: &dyn FrameSource,
    reference: &str,
) -> Result<Manifest, ManifestFetchError> {
    let bytes = source.fetch(reference).await?;
    let manifest = Manifest::from_slice(&bytes)?;
    info!(frames = manifest.len(), "Loaded manifest");
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_slice(
            br#"[{"timestamp": 100, "reference": "a.json"}, {"timestamp": 400, "reference": "b.json"}]"#,
        )
        .unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.entries[1].reference, "b.json");
    }

    #[test]
    fn test_parse_failure() {
        let err = Manifest::from_slice(br#"{"timestamp": 100}"#).unwrap_err();
        assert!(matches!(err, ManifestFetchError::Parse(_)));
    }

    #[test]
    fn test_empty_manifest() {
        assert!(Manifest::from_slice(b"[]").unwrap().is_empty());
    }
}
