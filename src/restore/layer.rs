//! Eager layer metadata restoration
//!
//! Writes one TOML descriptor per reusable layer under
//! `<layers>/<escaped-buildpack-id>/<layer>.toml`, plus a `<layer>.sha`
//! sidecar holding the bare checksum when sidecar mode is on. Only
//! buildpacks in the current group are considered; records from
//! buildpacks dropped since the previous build are left behind.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::buildpack::{escape_id, GroupBuildpack};
use crate::encoding;
use crate::error::{CairnError, CairnResult};
use crate::metadata::{CacheMetadata, LayerMetadata, LayersMetadata};

/// Checksums of the layers whose metadata was written to disk
///
/// Keyed by unescaped buildpack identifier, then layer name. The build
/// phase consults this map to decide reuse without recomputing hashes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoredLayers {
    layers: BTreeMap<String, BTreeMap<String, String>>,
}

impl RestoredLayers {
    pub fn record(&mut self, buildpack_id: &str, layer_name: &str, sha: &str) {
        self.layers
            .entry(buildpack_id.to_string())
            .or_default()
            .insert(layer_name.to_string(), sha.to_string());
    }

    /// Checksum recorded for the given layer, if it was restored
    pub fn sha_for(&self, buildpack_id: &str, layer_name: &str) -> Option<&str> {
        self.layers
            .get(buildpack_id)
            .and_then(|layers| layers.get(layer_name))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Writes per-layer metadata to disk ahead of the build phase
#[async_trait]
pub trait LayerMetadataRestorer: Send + Sync {
    /// Materialize descriptors for every reusable layer in `group`
    ///
    /// With `sha_files` set, each descriptor gets a checksum sidecar.
    /// Empty metadata inputs are valid and produce an empty result.
    async fn restore(
        &self,
        group: &[GroupBuildpack],
        app_metadata: &LayersMetadata,
        cache_metadata: &CacheMetadata,
        sha_files: bool,
    ) -> CairnResult<RestoredLayers>;
}

/// On-disk form of a restored layer's metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    #[serde(default)]
    pub sha: String,

    #[serde(default)]
    pub cache: bool,

    /// Opaque buildpack-defined payload, serialized under `[metadata]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl From<&LayerMetadata> for LayerDescriptor {
    fn from(layer: &LayerMetadata) -> Self {
        Self {
            sha: layer.sha.clone(),
            cache: layer.cache,
            metadata: layer.data.clone(),
        }
    }
}

impl LayerDescriptor {
    /// Read a descriptor written by a previous restoration
    pub async fn from_file(path: &Path) -> CairnResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CairnError::io(format!("reading layer descriptor {}", path.display()), e))?;
        Ok(toml::from_str(&content)?)
    }
}

/// Default restorer writing descriptors under a layers directory
pub struct DefaultLayerMetadataRestorer {
    layers_dir: PathBuf,
    skip_layers: bool,
}

impl DefaultLayerMetadataRestorer {
    pub fn new(layers_dir: impl Into<PathBuf>, skip_layers: bool) -> Self {
        Self {
            layers_dir: layers_dir.into(),
            skip_layers,
        }
    }

    fn buildpack_dir(&self, buildpack_id: &str) -> PathBuf {
        self.layers_dir.join(escape_id(buildpack_id))
    }

    async fn restore_store_toml(
        &self,
        app_metadata: &LayersMetadata,
        group: &[GroupBuildpack],
    ) -> CairnResult<()> {
        for buildpack in group {
            let store = app_metadata
                .metadata_for(&buildpack.id)
                .and_then(|meta| meta.store.as_ref());
            if let Some(store) = store {
                let path = self.buildpack_dir(&buildpack.id).join("store.toml");
                encoding::write_toml(&path, store).await?;
            }
        }
        Ok(())
    }

    async fn write_layer(
        &self,
        buildpack_id: &str,
        layer_name: &str,
        layer: &LayerMetadata,
        sha_files: bool,
        restored: &mut RestoredLayers,
    ) -> CairnResult<()> {
        let dir = self.buildpack_dir(buildpack_id);
        let descriptor = LayerDescriptor::from(layer);
        encoding::write_toml(&dir.join(format!("{layer_name}.toml")), &descriptor).await?;
        if sha_files && !layer.sha.is_empty() {
            encoding::write_atomic(&dir.join(format!("{layer_name}.sha")), layer.sha.as_bytes())
                .await?;
        }
        restored.record(buildpack_id, layer_name, &layer.sha);
        Ok(())
    }
}

#[async_trait]
impl LayerMetadataRestorer for DefaultLayerMetadataRestorer {
    async fn restore(
        &self,
        group: &[GroupBuildpack],
        app_metadata: &LayersMetadata,
        cache_metadata: &CacheMetadata,
        sha_files: bool,
    ) -> CairnResult<RestoredLayers> {
        let mut restored = RestoredLayers::default();

        self.restore_store_toml(app_metadata, group).await?;

        if self.skip_layers {
            info!("Skipping buildpack layer analysis");
            return Ok(restored);
        }

        for buildpack in group {
            let app_layers = app_metadata
                .metadata_for(&buildpack.id)
                .map(|meta| &meta.layers);
            let cached_layers = cache_metadata
                .metadata_for(&buildpack.id)
                .map(|meta| &meta.layers);

            let mut layer_names: BTreeSet<&String> = BTreeSet::new();
            if let Some(layers) = app_layers {
                layer_names.extend(layers.keys());
            }
            if let Some(layers) = cached_layers {
                layer_names.extend(layers.keys());
            }

            for layer_name in layer_names {
                if !valid_layer_name(layer_name) {
                    warn!("Ignoring layer {}:{}, invalid layer name", buildpack.id, layer_name);
                    continue;
                }
                let app = app_layers.and_then(|layers| layers.get(layer_name));
                let cached = cached_layers.and_then(|layers| layers.get(layer_name));
                match select_layer(app, cached) {
                    Some((layer, source)) => {
                        info!(
                            "Restoring metadata for {}:{} from {}",
                            buildpack.id,
                            layer_name,
                            source.describe()
                        );
                        self.write_layer(&buildpack.id, layer_name, layer, sha_files, &mut restored)
                            .await?;
                    }
                    None => {
                        debug!(
                            "Not restoring metadata for {}:{}, not eligible for reuse",
                            buildpack.id, layer_name
                        );
                    }
                }
            }
        }

        Ok(restored)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerSource {
    PreviousImage,
    Cache,
}

impl LayerSource {
    fn describe(self) -> &'static str {
        match self {
            Self::PreviousImage => "previous image",
            Self::Cache => "cache",
        }
    }
}

/// Whether a layer name is usable as a single path segment
///
/// Names come from image labels and cache metadata, which are not
/// trusted input. Anything that could point outside the buildpack's
/// directory is rejected.
fn valid_layer_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Pick which record to restore for a single layer
///
/// Current cache state is authoritative for cache-eligible layers;
/// otherwise the previous image's record stands. A record only present
/// in the cache but not marked cache-eligible restores nothing.
fn select_layer<'a>(
    app: Option<&'a LayerMetadata>,
    cached: Option<&'a LayerMetadata>,
) -> Option<(&'a LayerMetadata, LayerSource)> {
    match (app, cached) {
        (_, Some(cached)) if cached.cache => Some((cached, LayerSource::Cache)),
        (Some(app), _) => Some((app, LayerSource::PreviousImage)),
        _ => None,
    }
}
