//! Image access abstraction
//!
//! Provides a trait for the narrow slice of image operations the
//! analyze phase needs. Backends (daemon-local images, remote registry
//! images) are supplied by the embedding platform.

use async_trait::async_trait;

use crate::error::CairnResult;
use crate::metadata::ImageIdentifier;

/// Abstract read-only image interface
///
/// A handle may point at an image that does not exist; that is an
/// expected state reported through [`found`](Image::found), not an
/// error. Errors from these methods mean the backing store itself
/// could not be reached and abort the analyze phase.
#[async_trait]
pub trait Image: Send + Sync {
    /// The reference this handle was opened with
    fn name(&self) -> &str;

    /// Whether the image exists in its backing store
    async fn found(&self) -> CairnResult<bool>;

    /// Content digest or daemon identifier of the image
    async fn identifier(&self) -> CairnResult<ImageIdentifier>;

    /// Value of the given label, or `""` when the label is unset
    async fn label(&self, key: &str) -> CairnResult<String>;
}
