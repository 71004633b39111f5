//! Layer and SBOM restoration
//!
//! Platform API versions before 0.7 expect the analyze phase to
//! materialize layer metadata on disk so the build phase can detect
//! reuse by filesystem inspection alone. Newer versions restore lazily
//! during build, and only the SBOM collaborator call remains.

pub mod layer;
pub mod sbom;

pub use layer::{
    DefaultLayerMetadataRestorer, LayerDescriptor, LayerMetadataRestorer, RestoredLayers,
};
pub use sbom::SbomRestorer;
