//! Layer metadata model and codecs
//!
//! The previous image's label, the cache's committed metadata, and the
//! `analyzed.toml` hand-off all share the structures defined here.
//! Decoding tolerates absence and corruption; only serialization of
//! results can fail.

pub mod analyzed;
pub mod label;
pub mod layers;

pub use analyzed::{AnalyzedMetadata, ImageIdentifier};
pub use label::{decode_layers_metadata, encode_layers_metadata, LAYER_METADATA_LABEL};
pub use layers::{
    BuildpackLayersMetadata, CacheMetadata, LayerMetadata, LayersMetadata, StoreMetadata,
};
