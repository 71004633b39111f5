//! SBOM restoration collaborator interface

use async_trait::async_trait;

use crate::error::CairnResult;
use crate::image::Image;

/// Restores the SBOM layer from an earlier build onto disk
///
/// Implementations live with the platform; this crate only drives the
/// call. The analyze phase invokes it exactly once per build, with an
/// empty digest when no previous SBOM exists, so implementations can
/// initialize their on-disk state even when there is nothing to
/// extract.
#[async_trait]
pub trait SbomRestorer: Send + Sync {
    /// Extract the SBOM layer with `digest` from `image`
    ///
    /// `image` is the previous image when one was supplied, otherwise
    /// the run image, and may be absent entirely. An empty `digest`
    /// means no SBOM layer was recorded.
    async fn restore_from_previous(
        &self,
        image: Option<&dyn Image>,
        digest: &str,
    ) -> CairnResult<()>;
}
