//! In-memory doubles for the collaborator interfaces
//!
//! Platforms embedding this crate need the same doubles to test their
//! wiring, so these live in the library rather than under `tests/`.
//! Each double records the calls it receives and can be primed to
//! fail, which is how collaborator failures are exercised.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::buildpack::GroupBuildpack;
use crate::cache::Cache;
use crate::error::{CairnError, CairnResult};
use crate::image::Image;
use crate::metadata::{CacheMetadata, ImageIdentifier, LayersMetadata};
use crate::restore::{LayerMetadataRestorer, RestoredLayers, SbomRestorer};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Image double with settable labels and found-ness
pub struct FakeImage {
    name: String,
    reference: String,
    found: bool,
    labels: HashMap<String, String>,
    label_error: Option<String>,
}

impl FakeImage {
    /// An image that exists and resolves to `reference`
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
            found: true,
            labels: HashMap::new(),
            label_error: None,
        }
    }

    /// An image whose backing store reports it missing
    pub fn not_found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: String::new(),
            found: false,
            labels: HashMap::new(),
            label_error: None,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Make every label read fail, as an unreachable backing store would
    pub fn failing_labels(mut self, reason: impl Into<String>) -> Self {
        self.label_error = Some(reason.into());
        self
    }
}

#[async_trait]
impl Image for FakeImage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn found(&self) -> CairnResult<bool> {
        Ok(self.found)
    }

    async fn identifier(&self) -> CairnResult<ImageIdentifier> {
        if !self.found {
            return Err(CairnError::image(&self.name, "image not found"));
        }
        Ok(ImageIdentifier::new(&self.reference))
    }

    async fn label(&self, key: &str) -> CairnResult<String> {
        if let Some(reason) = &self.label_error {
            return Err(CairnError::image(&self.name, reason.clone()));
        }
        Ok(self.labels.get(key).cloned().unwrap_or_default())
    }
}

/// One recorded [`SbomRestorer`] invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SbomRestoreCall {
    pub image_name: Option<String>,
    pub digest: String,
}

/// Recording SBOM restorer double
#[derive(Default)]
pub struct FakeSbomRestorer {
    error: Option<String>,
    calls: Mutex<Vec<SbomRestoreCall>>,
}

impl FakeSbomRestorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<SbomRestoreCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl SbomRestorer for FakeSbomRestorer {
    async fn restore_from_previous(
        &self,
        image: Option<&dyn Image>,
        digest: &str,
    ) -> CairnResult<()> {
        lock(&self.calls).push(SbomRestoreCall {
            image_name: image.map(|image| image.name().to_string()),
            digest: digest.to_string(),
        });
        match &self.error {
            Some(reason) => Err(CairnError::io(
                "restoring sbom layer",
                std::io::Error::other(reason.clone()),
            )),
            None => Ok(()),
        }
    }
}

/// One recorded [`LayerMetadataRestorer`] invocation
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRestoreCall {
    pub group: Vec<GroupBuildpack>,
    pub app_metadata: LayersMetadata,
    pub cache_metadata: CacheMetadata,
    pub sha_files: bool,
}

/// Recording layer metadata restorer double
#[derive(Default)]
pub struct FakeLayerMetadataRestorer {
    error: Option<String>,
    result: RestoredLayers,
    calls: Mutex<Vec<LayerRestoreCall>>,
}

impl FakeLayerMetadataRestorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(result: RestoredLayers) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<LayerRestoreCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl LayerMetadataRestorer for FakeLayerMetadataRestorer {
    async fn restore(
        &self,
        group: &[GroupBuildpack],
        app_metadata: &LayersMetadata,
        cache_metadata: &CacheMetadata,
        sha_files: bool,
    ) -> CairnResult<RestoredLayers> {
        lock(&self.calls).push(LayerRestoreCall {
            group: group.to_vec(),
            app_metadata: app_metadata.clone(),
            cache_metadata: cache_metadata.clone(),
            sha_files,
        });
        match &self.error {
            Some(reason) => Err(CairnError::io(
                "restoring layer metadata",
                std::io::Error::other(reason.clone()),
            )),
            None => Ok(self.result.clone()),
        }
    }
}

/// Cache double with primed metadata and failure injection
pub struct FakeCache {
    name: String,
    exists: bool,
    error: Option<String>,
    committed: Mutex<CacheMetadata>,
    staged: Mutex<Option<CacheMetadata>>,
}

impl FakeCache {
    /// A cache whose committed metadata is already populated
    pub fn with_metadata(metadata: CacheMetadata) -> Self {
        Self {
            name: "fake-cache".to_string(),
            exists: true,
            error: None,
            committed: Mutex::new(metadata),
            staged: Mutex::new(None),
        }
    }

    /// A cache with no committed state
    pub fn empty() -> Self {
        Self::with_metadata(CacheMetadata::default())
    }

    /// A cache store that was never created
    pub fn absent() -> Self {
        Self {
            exists: false,
            ..Self::empty()
        }
    }

    /// A cache whose metadata reads fail
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::empty()
        }
    }
}

#[async_trait]
impl Cache for FakeCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> bool {
        self.exists
    }

    async fn set_metadata(&self, metadata: &CacheMetadata) -> CairnResult<()> {
        *lock(&self.staged) = Some(metadata.clone());
        Ok(())
    }

    async fn metadata(&self) -> CairnResult<CacheMetadata> {
        if let Some(reason) = &self.error {
            return Err(CairnError::cache(&self.name, reason.clone()));
        }
        Ok(lock(&self.committed).clone())
    }

    async fn commit(&self) -> CairnResult<()> {
        if let Some(staged) = lock(&self.staged).take() {
            *lock(&self.committed) = staged;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::LAYER_METADATA_LABEL;

    #[tokio::test]
    async fn fake_image_reports_labels_and_absence() {
        let image = FakeImage::new("some-image", "s0m3D1g3sT")
            .with_label(LAYER_METADATA_LABEL, "{}");

        assert!(image.found().await.unwrap());
        assert_eq!(image.identifier().await.unwrap().reference, "s0m3D1g3sT");
        assert_eq!(image.label(LAYER_METADATA_LABEL).await.unwrap(), "{}");
        assert_eq!(image.label("unset").await.unwrap(), "");

        let missing = FakeImage::not_found("gone-image");
        assert!(!missing.found().await.unwrap());
    }

    #[tokio::test]
    async fn fake_sbom_restorer_records_calls() {
        let restorer = FakeSbomRestorer::new();
        let image = FakeImage::new("some-image", "ref");

        restorer
            .restore_from_previous(Some(&image), "some-digest")
            .await
            .unwrap();
        restorer.restore_from_previous(None, "").await.unwrap();

        let calls = restorer.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].image_name.as_deref(), Some("some-image"));
        assert_eq!(calls[0].digest, "some-digest");
        assert_eq!(calls[1].image_name, None);

        let failing = FakeSbomRestorer::failing("disk full");
        assert!(failing.restore_from_previous(None, "").await.is_err());
        assert_eq!(failing.calls().len(), 1);
    }

    #[tokio::test]
    async fn fake_cache_stages_then_commits() {
        let cache = FakeCache::empty();
        let metadata: CacheMetadata =
            serde_json::from_str(r#"{"buildpacks":[{"key":"bp.one","layers":{}}]}"#).unwrap();

        cache.set_metadata(&metadata).await.unwrap();
        assert_eq!(cache.metadata().await.unwrap(), CacheMetadata::default());

        cache.commit().await.unwrap();
        assert_eq!(cache.metadata().await.unwrap(), metadata);
    }
}
