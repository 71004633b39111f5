//! Analyze phase orchestration
//!
//! Reads the previous image's metadata label, resolves image
//! references, drives SBOM restoration, and, for pre-0.7 platform
//! contracts, drives eager layer metadata restoration. The analyzer
//! itself writes no files; all materialization happens in the
//! restorer it is handed.

use std::sync::Arc;

use tracing::{debug, info};

use crate::buildpack::GroupBuildpack;
use crate::cache::Cache;
use crate::error::CairnResult;
use crate::image::Image;
use crate::metadata::{
    decode_layers_metadata, AnalyzedMetadata, CacheMetadata, ImageIdentifier, LayersMetadata,
    LAYER_METADATA_LABEL,
};
use crate::platform::Restoration;
use crate::restore::SbomRestorer;

/// Coordinates the analyze phase
///
/// Collaborator handles stay owned by the embedding platform; the
/// analyzer only drives them. A missing previous image, run image, or
/// cache is an expected configuration, not an error.
pub struct Analyzer {
    pub previous_image: Option<Arc<dyn Image>>,
    pub run_image: Option<Arc<dyn Image>>,
    pub cache: Option<Arc<dyn Cache>>,
    pub buildpacks: Vec<GroupBuildpack>,
    pub sbom_restorer: Arc<dyn SbomRestorer>,
    pub restoration: Restoration,
}

impl Analyzer {
    /// Run the analyze phase
    ///
    /// Succeeds with empty metadata when there is no usable previous
    /// build state. Fails only when a collaborator itself fails.
    pub async fn analyze(&self) -> CairnResult<AnalyzedMetadata> {
        let mut app_metadata = LayersMetadata::default();
        let mut previous_image_id = None;

        if let Some(image) = &self.previous_image {
            previous_image_id = identify(image.as_ref()).await?;
            if previous_image_id.is_some() {
                let label = image.label(LAYER_METADATA_LABEL).await?;
                app_metadata = decode_layers_metadata(&label);
            }
        }

        let run_image_id = match &self.run_image {
            Some(image) => identify(image.as_ref()).await?,
            None => None,
        };

        // The SBOM restorer runs even without a previous image so it
        // can initialize its on-disk state.
        let sbom_source = self.previous_image.as_deref().or(self.run_image.as_deref());
        self.sbom_restorer
            .restore_from_previous(sbom_source, app_metadata.sbom_sha())
            .await?;

        if let Restoration::Eager { restorer, sha_files } = &self.restoration {
            let cache_metadata = self.committed_cache_metadata().await?;
            restorer
                .restore(&self.buildpacks, &app_metadata, &cache_metadata, *sha_files)
                .await?;
        }

        Ok(AnalyzedMetadata {
            previous_image: previous_image_id,
            metadata: app_metadata,
            run_image: run_image_id,
        })
    }

    async fn committed_cache_metadata(&self) -> CairnResult<CacheMetadata> {
        let Some(cache) = &self.cache else {
            debug!("No cache provided, using empty cache metadata");
            return Ok(CacheMetadata::default());
        };
        if !cache.exists().await {
            info!("Layer cache not found");
            return Ok(CacheMetadata::default());
        }
        cache.metadata().await
    }
}

/// Resolve an image handle to its identifier
///
/// An image missing from its backing store resolves to `None`; only a
/// store that cannot be reached at all produces an error.
async fn identify(image: &dyn Image) -> CairnResult<Option<ImageIdentifier>> {
    if !image.found().await? {
        info!("Image {} not found", image.name());
        return Ok(None);
    }
    let identifier = image.identifier().await?;
    debug!("Analyzing image {}", identifier.reference);
    Ok(Some(identifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeCache, FakeImage, FakeSbomRestorer};

    fn bare_analyzer(sbom_restorer: Arc<FakeSbomRestorer>) -> Analyzer {
        Analyzer {
            previous_image: None,
            run_image: None,
            cache: None,
            buildpacks: Vec::new(),
            sbom_restorer,
            restoration: Restoration::Lazy,
        }
    }

    #[tokio::test]
    async fn identify_resolves_found_images() {
        let image = FakeImage::new("some-image", "s0m3D1g3sT");
        let id = identify(&image).await.unwrap();
        assert_eq!(id, Some(ImageIdentifier::new("s0m3D1g3sT")));
    }

    #[tokio::test]
    async fn identify_treats_missing_images_as_absent() {
        let image = FakeImage::not_found("gone-image");
        assert_eq!(identify(&image).await.unwrap(), None);
    }

    #[tokio::test]
    async fn analyze_without_collaborators_returns_empty_result() {
        let sbom = Arc::new(FakeSbomRestorer::new());
        let analyzer = bare_analyzer(sbom.clone());

        let analyzed = analyzer.analyze().await.unwrap();

        assert_eq!(analyzed, AnalyzedMetadata::default());
        let calls = sbom.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].image_name, None);
        assert_eq!(calls[0].digest, "");
    }

    #[tokio::test]
    async fn cache_metadata_defaults_without_usable_cache() {
        let sbom = Arc::new(FakeSbomRestorer::new());

        let no_cache = bare_analyzer(sbom.clone());
        assert_eq!(
            no_cache.committed_cache_metadata().await.unwrap(),
            CacheMetadata::default()
        );

        let mut absent_cache = bare_analyzer(sbom.clone());
        absent_cache.cache = Some(Arc::new(FakeCache::absent()));
        assert_eq!(
            absent_cache.committed_cache_metadata().await.unwrap(),
            CacheMetadata::default()
        );
    }

    #[tokio::test]
    async fn cache_read_failures_propagate() {
        let mut analyzer = bare_analyzer(Arc::new(FakeSbomRestorer::new()));
        analyzer.cache = Some(Arc::new(FakeCache::failing("volume unreadable")));

        let result = analyzer.committed_cache_metadata().await;
        assert!(result.is_err());
    }
}
