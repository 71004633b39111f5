//! Platform contract behavior
//!
//! The negotiated API version decides whether layer metadata is
//! restored eagerly during analyze or lazily during build. That
//! comparison happens exactly once, in [`Platform::restores_layer_metadata`];
//! everything else branches on the [`Restoration`] strategy selected
//! at construction.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::api::PlatformApi;
use crate::restore::{DefaultLayerMetadataRestorer, LayerMetadataRestorer};

/// The platform contract negotiated for this build
#[derive(Debug, Clone)]
pub struct Platform {
    api: PlatformApi,
}

impl Platform {
    pub fn new(api: PlatformApi) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &PlatformApi {
        &self.api
    }

    /// Whether the analyze phase materializes layer metadata on disk
    ///
    /// Platform API 0.7 moved layer restoration into the build phase;
    /// older contracts expect descriptors written before build starts.
    pub fn restores_layer_metadata(&self) -> bool {
        self.api.less_than(0, 7)
    }

    /// Select the restoration strategy for this contract
    ///
    /// Eager restoration always writes checksum sidecars; the build
    /// phase of pre-0.7 platforms reads them back for reuse detection.
    pub fn restoration(&self, layers_dir: impl Into<PathBuf>, skip_layers: bool) -> Restoration {
        if self.restores_layer_metadata() {
            debug!("Platform API {} restores layer metadata during analysis", self.api());
            Restoration::Eager {
                restorer: Arc::new(DefaultLayerMetadataRestorer::new(layers_dir.into(), skip_layers)),
                sha_files: true,
            }
        } else {
            debug!("Platform API {} leaves layer restoration to the build phase", self.api());
            Restoration::Lazy
        }
    }
}

/// How layer metadata reaches the build phase
#[derive(Clone)]
pub enum Restoration {
    /// Write descriptors during analyze (platform API < 0.7)
    Eager {
        restorer: Arc<dyn LayerMetadataRestorer>,
        sha_files: bool,
    },
    /// Leave restoration to the build phase (platform API >= 0.7)
    Lazy,
}

impl Restoration {
    pub fn is_eager(&self) -> bool {
        matches!(self, Self::Eager { .. })
    }
}
