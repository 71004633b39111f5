//! Layer metadata structures
//!
//! These mirror the document embedded in the previous image's metadata
//! label and the document committed alongside a cache volume. Unknown
//! fields in either source are ignored so that newer producers do not
//! break older consumers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata for all layers recorded by a previous build
///
/// This is the shape of the image metadata label. Missing sections
/// deserialize to their empty forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayersMetadata {
    /// Per-buildpack layer records
    #[serde(default)]
    pub buildpacks: Vec<BuildpackLayersMetadata>,

    /// Digest of the dedicated SBOM layer, when one was exported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbom: Option<LayerMetadata>,
}

/// Metadata for the layers currently sitting in a cache
///
/// Same shape as [`LayersMetadata`] but sourced from the cache
/// collaborator, so it reflects cache contents rather than what the
/// previous image's label claims.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    #[serde(default)]
    pub buildpacks: Vec<BuildpackLayersMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbom: Option<LayerMetadata>,
}

/// Layer records for a single buildpack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildpackLayersMetadata {
    /// Buildpack identifier, serialized under the historical `key` name
    #[serde(rename = "key", default)]
    pub id: String,

    #[serde(default)]
    pub version: String,

    /// Layer name to layer record
    #[serde(default)]
    pub layers: BTreeMap<String, LayerMetadata>,

    /// Persistent key/value store shared by the buildpack's layers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreMetadata>,
}

/// Record for a single layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerMetadata {
    /// Content hash of the layer's data
    #[serde(default)]
    pub sha: String,

    /// Whether the layer's contents are eligible for cache reuse
    #[serde(default)]
    pub cache: bool,

    /// Opaque buildpack-defined payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Buildpack-defined store payload, persisted as `store.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreMetadata {
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl LayersMetadata {
    /// Layer records for the given buildpack, if any
    pub fn metadata_for(&self, buildpack_id: &str) -> Option<&BuildpackLayersMetadata> {
        self.buildpacks.iter().find(|bp| bp.id == buildpack_id)
    }

    /// Digest of the SBOM layer, or `""` when none was recorded
    pub fn sbom_sha(&self) -> &str {
        self.sbom.as_ref().map(|layer| layer.sha.as_str()).unwrap_or("")
    }
}

impl CacheMetadata {
    /// Layer records for the given buildpack, if any
    pub fn metadata_for(&self, buildpack_id: &str) -> Option<&BuildpackLayersMetadata> {
        self.buildpacks.iter().find(|bp| bp.id == buildpack_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_LABEL: &str = r#"{
        "buildpacks": [
            {
                "key": "metadata.buildpack",
                "version": "4.5.6",
                "layers": {
                    "launch-layer": {
                        "sha": "sha256:launch-sha",
                        "cache": false,
                        "data": {"mcount": "432"}
                    },
                    "cache-layer": {
                        "sha": "sha256:cache-sha",
                        "cache": true
                    }
                },
                "store": {
                    "metadata": {"metadata-key": "metadata-val"}
                }
            }
        ],
        "sbom": {"sha": "some-digest"}
    }"#;

    #[test]
    fn deserializes_full_document() {
        let metadata: LayersMetadata = serde_json::from_str(FULL_LABEL).unwrap();
        assert_eq!(metadata.buildpacks.len(), 1);

        let bp = &metadata.buildpacks[0];
        assert_eq!(bp.id, "metadata.buildpack");
        assert_eq!(bp.version, "4.5.6");
        assert_eq!(bp.layers["launch-layer"].sha, "sha256:launch-sha");
        assert!(!bp.layers["launch-layer"].cache);
        assert!(bp.layers["cache-layer"].cache);
        assert_eq!(
            bp.store.as_ref().unwrap().metadata["metadata-key"],
            serde_json::json!("metadata-val")
        );
        assert_eq!(metadata.sbom_sha(), "some-digest");
    }

    #[test]
    fn round_trips_through_json() {
        let metadata: LayersMetadata = serde_json::from_str(FULL_LABEL).unwrap();
        let encoded = serde_json::to_string(&metadata).unwrap();
        let decoded: LayersMetadata = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn ignores_unknown_fields() {
        let raw = r#"{
            "buildpacks": [{"key": "bp.one", "layers": {}, "future-field": 7}],
            "launcher": {"sha": "sha256:launcher"},
            "runImage": {"topLayer": "sha256:top"}
        }"#;
        let metadata: LayersMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(metadata.buildpacks[0].id, "bp.one");
        assert!(metadata.sbom.is_none());
    }

    #[test]
    fn metadata_for_finds_by_id() {
        let metadata: LayersMetadata = serde_json::from_str(FULL_LABEL).unwrap();
        assert!(metadata.metadata_for("metadata.buildpack").is_some());
        assert!(metadata.metadata_for("absent.buildpack").is_none());
    }

    #[test]
    fn sbom_sha_defaults_to_empty() {
        let metadata = LayersMetadata::default();
        assert_eq!(metadata.sbom_sha(), "");
    }

    #[test]
    fn empty_document_is_default() {
        let metadata: LayersMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(metadata, LayersMetadata::default());
    }
}
