//! Metadata label codec
//!
//! The previous image carries its layer metadata as a JSON document in
//! a well-known label. First builds have no label, and a corrupt label
//! must never abort a build, so decoding degrades to the empty document
//! instead of failing. Only the surrounding collaborator I/O can fail.

use serde::de::DeserializeOwned;
use tracing::warn;

use super::layers::LayersMetadata;
use crate::error::CairnResult;

/// Label key under which a built image records its layer metadata
pub const LAYER_METADATA_LABEL: &str = "io.buildpacks.lifecycle.metadata";

/// Decode the layer metadata label
///
/// An empty, malformed, or wrong-shaped value decodes to the empty
/// document. Valid content with unknown extra fields decodes normally.
pub fn decode_layers_metadata(raw: &str) -> LayersMetadata {
    decode_or_default(raw, LAYER_METADATA_LABEL)
}

/// Encode layer metadata for embedding in an image label
pub fn encode_layers_metadata(metadata: &LayersMetadata) -> CairnResult<String> {
    Ok(serde_json::to_string(metadata)?)
}

/// Decode a JSON metadata document, falling back to the default value
///
/// Shared by the label codec and the cache metadata reader, which have
/// the same tolerance contract.
pub(crate) fn decode_or_default<T>(raw: &str, what: &str) -> T
where
    T: DeserializeOwned + Default,
{
    if raw.is_empty() {
        return T::default();
    }
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("Ignoring unreadable {}: {}", what, err);
            T::default()
        }
    }
}
